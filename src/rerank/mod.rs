// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Cross-encoder reranking
//!
//! A [`PairScorer`] scores `(query, document)` pairs jointly;
//! [`rank_by_score`] orders the candidates and keeps the best `top_k`.

pub mod cross_encoder;

pub use cross_encoder::OnnxCrossEncoder;

use anyhow::Result;
use async_trait::async_trait;

/// A loaded model that scores a query against each document
#[async_trait]
pub trait PairScorer: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns one relevance score per document, in document order
    async fn score_pairs(&self, query: String, documents: Vec<String>) -> Result<Vec<f32>>;
}

/// Sorts `items` by descending score and keeps at most `top_k`
///
/// The sort is stable: equal scores keep their input order.
///
/// # Errors
/// Returns error if `scores` and `items` differ in length, or if any score
/// is NaN or infinite.
pub fn rank_by_score<T>(items: Vec<T>, scores: Vec<f32>, top_k: usize) -> Result<Vec<(T, f32)>> {
    if items.len() != scores.len() {
        anyhow::bail!(
            "Score count mismatch: {} documents but {} scores",
            items.len(),
            scores.len()
        );
    }

    if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
        anyhow::bail!("Non-finite score {} for document {}", scores[index], index);
    }

    let mut ranked: Vec<(T, f32)> = items.into_iter().zip(scores).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_k);
    Ok(ranked)
}

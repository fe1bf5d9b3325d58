// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX cross-encoder (e.g. BAAI/bge-reranker-base)
//!
//! Each `(query, document)` pair is tokenized as a sentence pair and scored
//! in one forward pass. The single output logit is squashed with a sigmoid,
//! so scores land in `[0, 1]`.

use crate::inference::{LoadOptions, OnnxSession};
use crate::models::ModelFiles;
use crate::rerank::PairScorer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::ArrayD;
use tracing::{debug, info};

#[derive(Clone)]
pub struct OnnxCrossEncoder {
    session: OnnxSession,
    model_name: String,
    batch_size: usize,
}

impl std::fmt::Debug for OnnxCrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxCrossEncoder")
            .field("model_name", &self.model_name)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl OnnxCrossEncoder {
    /// Loads the cross-encoder and checks it yields one score per pair
    pub fn load(model_name: impl Into<String>, files: &ModelFiles, options: &LoadOptions) -> Result<Self> {
        let model_name = model_name.into();

        info!("Initializing ONNX cross-encoder {}", model_name);
        let session = OnnxSession::load(&files.model_path, &files.tokenizer_path, options)?;

        let model = Self {
            session,
            model_name,
            batch_size: options.batch_size.max(1),
        };

        let probe = model
            .score_chunk("validation query", &["validation document".to_string()])
            .context("Validation inference failed")?;
        if probe.len() != 1 {
            anyhow::bail!("Cross-encoder returned {} scores for 1 pair", probe.len());
        }

        info!("ONNX cross-encoder loaded: {}", model.model_name);
        Ok(model)
    }

    /// Scores every document against `query`, `batch_size` pairs per run
    pub fn score_blocking(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(documents.len());
        for chunk in documents.chunks(self.batch_size) {
            scores.extend(self.score_chunk(query, chunk)?);
        }
        Ok(scores)
    }

    fn score_chunk(&self, query: &str, documents: &[String]) -> Result<Vec<f32>> {
        let pairs: Vec<(&str, &str)> = documents.iter().map(|doc| (query, doc.as_str())).collect();
        let batch = self.session.encode(pairs)?;
        let logits = self.session.run(&batch)?;
        debug!(
            batch = batch.batch_size(),
            shape = ?logits.shape(),
            "Cross-encoder batch inference complete"
        );
        scores_from_logits(logits, batch.batch_size())
    }
}

#[async_trait]
impl PairScorer for OnnxCrossEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn score_pairs(&self, query: String, documents: Vec<String>) -> Result<Vec<f32>> {
        let model = self.clone();
        tokio::task::spawn_blocking(move || model.score_blocking(&query, &documents))
            .await
            .context("Rerank task panicked")?
    }
}

/// Maps `[batch, 1]` (or `[batch]`) logits to sigmoid scores
pub fn scores_from_logits(logits: ArrayD<f32>, batch_size: usize) -> Result<Vec<f32>> {
    let shape = logits.shape().to_vec();
    let per_item = match shape.as_slice() {
        [n] if *n == batch_size => 1,
        [n, labels] if *n == batch_size && *labels >= 1 => *labels,
        _ => anyhow::bail!(
            "Cross-encoder outputs unexpected dimensions: {:?} (expected [{}, 1])",
            shape,
            batch_size
        ),
    };

    let flat: Vec<f32> = logits.iter().copied().collect();
    if flat.iter().any(|logit| logit.is_nan()) {
        anyhow::bail!("Cross-encoder produced a NaN logit");
    }

    Ok(flat
        .chunks(per_item)
        .map(|labels| sigmoid(labels[0]))
        .collect())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

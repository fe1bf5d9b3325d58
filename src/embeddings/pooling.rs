// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pooling and normalization of token-level hidden states
//!
//! Sentence-transformer models ship a `1_Pooling/config.json` describing how
//! token embeddings collapse into one sentence vector. BGE models use the
//! CLS token, MiniLM-style models use an attention-masked mean.

use anyhow::{Context, Result};
use ndarray::ArrayView2;
use serde::Deserialize;
use std::path::Path;

/// Strategy for reducing `[seq_len, hidden_dim]` to `[hidden_dim]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Pooling {
    /// Hidden state of the first token
    Cls,
    /// Mean over tokens whose attention mask is 1
    #[default]
    Mean,
}

/// Subset of the sentence-transformers pooling config we act on
#[derive(Debug, Deserialize)]
struct PoolingConfig {
    #[serde(default)]
    pooling_mode_cls_token: bool,
    #[serde(default)]
    pooling_mode_mean_tokens: bool,
}

impl Pooling {
    /// Parses a sentence-transformers pooling config
    ///
    /// CLS wins when both flags are set; a config with neither flag falls
    /// back to mean pooling.
    pub fn from_config_json(json: &str) -> Result<Self> {
        let config: PoolingConfig =
            serde_json::from_str(json).context("Failed to parse pooling config")?;

        if config.pooling_mode_cls_token {
            Ok(Pooling::Cls)
        } else if config.pooling_mode_mean_tokens {
            Ok(Pooling::Mean)
        } else {
            Ok(Pooling::default())
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pooling config {}", path.display()))?;
        Self::from_config_json(&json)
    }

    /// Pools one sequence of hidden states
    ///
    /// `mask` must have one entry per row of `hidden`.
    pub fn pool(&self, hidden: ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
        let (seq_len, hidden_dim) = hidden.dim();

        match self {
            Pooling::Cls => {
                if seq_len == 0 {
                    return vec![0.0; hidden_dim];
                }
                hidden.row(0).to_vec()
            }
            Pooling::Mean => {
                let mut pooled = vec![0.0f32; hidden_dim];
                let mut sum_mask = 0.0f32;

                for (i, row) in hidden.outer_iter().enumerate() {
                    let mask_value = mask.get(i).copied().unwrap_or(0) as f32;
                    if mask_value == 0.0 {
                        continue;
                    }
                    sum_mask += mask_value;
                    for (acc, value) in pooled.iter_mut().zip(row.iter()) {
                        *acc += value * mask_value;
                    }
                }

                for val in &mut pooled {
                    *val /= sum_mask.max(1e-9);
                }
                pooled
            }
        }
    }
}

impl std::fmt::Display for Pooling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pooling::Cls => write!(f, "cls"),
            Pooling::Mean => write!(f, "mean"),
        }
    }
}

/// Scales `vector` to unit L2 norm in place; zero vectors are left as-is
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

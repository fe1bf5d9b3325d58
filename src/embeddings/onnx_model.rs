// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence-transformer exported to ONNX (e.g. BAAI/bge-base-en-v1.5).
//!
//! Features:
//! - ONNX model loading from resolved model files
//! - GPU acceleration via CUDA (with automatic CPU fallback, `cuda` feature)
//! - Tokenization with truncation and per-batch padding
//! - CLS or attention-masked mean pooling
//! - L2 normalization of every output vector
//! - Output dimension detected from the model at load time

use crate::embeddings::{l2_normalize, Pooling, TextEmbedder};
use crate::inference::{EncodedBatch, LoadOptions, OnnxSession};
use crate::models::ModelFiles;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ndarray::{ArrayD, Axis, Ix2};
use tracing::{debug, info};

/// ONNX-based sentence embedding model
///
/// # Thread Safety
/// The underlying session is shared behind `Arc<Mutex<_>>`, so clones are
/// cheap and inference calls are serialized.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: OnnxSession,

    /// Model name (e.g., "BAAI/bge-base-en-v1.5")
    model_name: String,

    pooling: Pooling,

    /// Output dimension, detected by a validation inference at load time
    dimension: usize,

    batch_size: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("pooling", &self.pooling)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and validates its output shape
    ///
    /// Pooling comes from `pooling_override`, else from the model's
    /// `1_Pooling/config.json`, else mean pooling.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The validation inference yields no usable vector
    ///
    /// # Example
    /// ```ignore
    /// let files = resolve_model_files(&ModelSource::parse("BAAI/bge-base-en-v1.5", "main"), "onnx/model.onnx", ModelRole::Embedder).await?;
    /// let model = OnnxEmbeddingModel::load("BAAI/bge-base-en-v1.5", &files, &LoadOptions::default(), None)?;
    /// ```
    pub fn load(
        model_name: impl Into<String>,
        files: &ModelFiles,
        options: &LoadOptions,
        pooling_override: Option<Pooling>,
    ) -> Result<Self> {
        let model_name = model_name.into();

        let pooling = match (pooling_override, &files.pooling_config) {
            (Some(pooling), _) => pooling,
            (None, Some(path)) => Pooling::from_config_file(path)?,
            (None, None) => Pooling::default(),
        };

        info!("Initializing ONNX embedding model {} ({} pooling)", model_name, pooling);
        let session = OnnxSession::load(&files.model_path, &files.tokenizer_path, options)?;

        let mut model = Self {
            session,
            model_name,
            pooling,
            dimension: 0,
            batch_size: options.batch_size.max(1),
        };

        let probe = model
            .embed_chunk(&["validation test".to_string()])
            .context("Validation inference failed")?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            anyhow::bail!("Model {} produced an empty embedding", model.model_name);
        }
        model.dimension = dimension;

        info!(
            "ONNX embedding model loaded: {} ({} dimensions)",
            model.model_name, model.dimension
        );
        Ok(model)
    }

    /// Embeds texts synchronously, `batch_size` texts per session run
    pub fn embed_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let vectors = self.embed_chunk(chunk)?;
            for (i, vector) in vectors.iter().enumerate() {
                if vector.len() != self.dimension {
                    anyhow::bail!(
                        "Unexpected embedding dimension at index {}: {} (expected {})",
                        embeddings.len() + i,
                        vector.len(),
                        self.dimension
                    );
                }
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let batch = self.session.encode(inputs)?;
        let output = self.session.run(&batch)?;
        debug!(
            batch = batch.batch_size(),
            shape = ?output.shape(),
            "Embedding batch inference complete"
        );
        sentence_vectors(output, &batch, self.pooling)
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }
}

#[async_trait]
impl TextEmbedder for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.clone();
        tokio::task::spawn_blocking(move || model.embed_blocking(&texts))
            .await
            .context("Embedding task panicked")?
    }
}

/// Turns the model's first output into one normalized vector per sequence
///
/// Accepts token-level hidden states `[batch, seq_len, hidden]` (pooled
/// with `pooling` under the batch attention mask) or already-pooled
/// `[batch, hidden]` sentence embeddings.
pub fn sentence_vectors(
    output: ArrayD<f32>,
    batch: &EncodedBatch,
    pooling: Pooling,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch.batch_size();
    let shape = output.shape().to_vec();

    if shape.first().copied() != Some(batch_size) {
        anyhow::bail!(
            "Model output batch {:?} does not match input batch {}",
            shape,
            batch_size
        );
    }

    let mut vectors = match shape.len() {
        3 => {
            let mut vectors = Vec::with_capacity(batch_size);
            for (i, item) in output.axis_iter(Axis(0)).enumerate() {
                let hidden = item
                    .into_dimensionality::<Ix2>()
                    .context("Failed to view token embeddings as [seq_len, hidden]")?;
                let mask = batch.attention_mask.row(i).to_vec();
                vectors.push(pooling.pool(hidden, &mask));
            }
            vectors
        }
        2 => output
            .axis_iter(Axis(0))
            .map(|row| row.iter().copied().collect())
            .collect(),
        _ => anyhow::bail!(
            "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden] or [batch, hidden])",
            shape
        ),
    };

    for vector in &mut vectors {
        l2_normalize(vector);
    }
    Ok(vectors)
}

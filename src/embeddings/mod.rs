// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embedding models
//!
//! Handlers only see the [`TextEmbedder`] trait; the production
//! implementation is [`OnnxEmbeddingModel`].

pub mod onnx_model;
pub mod pooling;

pub use onnx_model::OnnxEmbeddingModel;
pub use pooling::{l2_normalize, Pooling};

use anyhow::Result;
use async_trait::async_trait;

/// A loaded model that turns texts into unit-length vectors
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Model identifier as configured (hub repo id or local path)
    fn model_name(&self) -> &str;

    /// Length of every vector returned by [`TextEmbedder::embed_batch`]
    fn dimension(&self) -> usize;

    /// Embeds `texts` in order; each vector has unit L2 norm
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

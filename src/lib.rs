// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod embeddings;
pub mod inference;
pub mod models;
pub mod rerank;
pub mod version;

pub use api::{EmbedState, RerankState};
pub use embeddings::{OnnxEmbeddingModel, TextEmbedder};
pub use rerank::{OnnxCrossEncoder, PairScorer};

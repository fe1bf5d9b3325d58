// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the RAG model API services

/// Semantic version number
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "text-embedding",
    "context-embedding",
    "cross-encoder-rerank",
    "onnx-runtime",
    "huggingface-hub-models",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("RAG Model API {}", VERSION)
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

/// Candidate document to be scored against the query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
}

/// Request body for POST /rerank
///
/// # Example
/// ```json
/// {
///   "query": "what is a cross-encoder?",
///   "documents": [{ "id": "doc-1", "content": "..." }],
///   "top_k": 3
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<Document>,

    /// Number of documents to return; negative values fail validation
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Default top_k: 5
fn default_top_k() -> usize {
    5
}

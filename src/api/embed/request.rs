// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request types for the two POST /embed variants
//!
//! Schema validation is serde deserialization: a missing or mistyped field
//! is rejected by the `Json` extractor with 422 before the handler runs.

use serde::{Deserialize, Serialize};

/// Request body for the text embedding service
///
/// # Example
/// ```json
/// { "texts": ["Hello world", "Another text"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedRequest {
    /// Texts to embed; an empty list yields an empty response
    pub texts: Vec<String>,
}

/// One record for the context embedding service
///
/// The request body is a bare array of these:
/// ```json
/// [{ "id": 1, "content": "first passage" }, { "id": 2, "content": "second" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Context {
    pub id: i64,
    pub content: String,
}

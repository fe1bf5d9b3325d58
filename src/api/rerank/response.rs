// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::api::rerank::Document;
use serde::{Deserialize, Serialize};

/// A document with its cross-encoder score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankResult {
    pub id: String,
    pub content: String,
    pub score: f32,
}

/// Response body for POST /rerank
///
/// `documents` is sorted by descending score and holds at most `top_k`
/// entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankResponse {
    pub documents: Vec<RerankResult>,
}

impl From<(Document, f32)> for RerankResult {
    fn from((document, score): (Document, f32)) -> Self {
        RerankResult {
            id: document.id,
            content: document.content,
            score,
        }
    }
}

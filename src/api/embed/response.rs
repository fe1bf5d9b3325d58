// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Response types for the two POST /embed variants

use crate::api::embed::Context;
use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Response body for the text embedding service
///
/// # Example
/// ```json
/// { "dimension": 768, "vectors": [[0.01, -0.02, ...], ...] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedResponse {
    /// Output dimensionality of the model
    pub dimension: usize,

    /// One unit-length vector per input text, in input order
    pub vectors: Vec<Vec<f32>>,
}

/// A context tagged with its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvertContext {
    pub id: i64,
    pub content: String,
    pub vector: Vec<f32>,
}

impl ConvertContext {
    /// Zips contexts with their vectors, preserving order and ids
    ///
    /// # Errors
    /// Returns `ApiError::InferenceFailed` if the model returned a different
    /// number of vectors than there were contexts.
    pub fn tag_all(contexts: Vec<Context>, vectors: Vec<Vec<f32>>) -> Result<Vec<Self>, ApiError> {
        if contexts.len() != vectors.len() {
            return Err(ApiError::InferenceFailed(format!(
                "model returned {} vectors for {} contexts",
                vectors.len(),
                contexts.len()
            )));
        }

        Ok(contexts
            .into_iter()
            .zip(vectors)
            .map(|(context, vector)| ConvertContext {
                id: context.id,
                content: context.content,
                vector,
            })
            .collect())
    }
}

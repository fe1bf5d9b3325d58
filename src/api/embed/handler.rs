// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed handlers
//!
//! Both services share the model call; they differ only in how the
//! request is unpacked and the vectors are reshaped.

use crate::api::embed::{Context, ConvertContext, EmbedRequest, EmbedResponse};
use crate::api::http_server::EmbedState;
use crate::api::ApiError;
use axum::{extract::State, Json};
use std::time::Instant;
use tracing::debug;

/// POST /embed handler for the text embedding service
///
/// # Request Body
/// ```json
/// { "texts": ["text1", "text2"] }
/// ```
///
/// # Response Body
/// ```json
/// { "dimension": 768, "vectors": [[...], [...]] }
/// ```
pub async fn embed_handler(
    State(state): State<EmbedState>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let vectors = embed_texts(&state, request.texts).await?;

    Ok(Json(EmbedResponse {
        dimension: state.embedder.dimension(),
        vectors,
    }))
}

/// POST /embed handler for the context embedding service
///
/// # Request Body
/// ```json
/// [{ "id": 1, "content": "text1" }]
/// ```
///
/// # Response Body
/// ```json
/// [{ "id": 1, "content": "text1", "vector": [...] }]
/// ```
pub async fn embed_contexts_handler(
    State(state): State<EmbedState>,
    Json(contexts): Json<Vec<Context>>,
) -> Result<Json<Vec<ConvertContext>>, ApiError> {
    let texts = contexts.iter().map(|context| context.content.clone()).collect();
    let vectors = embed_texts(&state, texts).await?;

    ConvertContext::tag_all(contexts, vectors).map(Json)
}

async fn embed_texts(state: &EmbedState, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ApiError> {
    if texts.is_empty() {
        return Ok(vec![]);
    }

    let count = texts.len();
    let started = Instant::now();

    let vectors = state
        .embedder
        .embed_batch(texts)
        .await
        .map_err(|e| ApiError::InferenceFailed(format!("{:#}", e)))?;

    if vectors.len() != count {
        return Err(ApiError::InferenceFailed(format!(
            "model returned {} vectors for {} texts",
            vectors.len(),
            count
        )));
    }
    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        return Err(ApiError::InferenceFailed(
            "model returned a non-finite embedding value".to_string(),
        ));
    }

    debug!(
        texts = count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Embedded batch"
    );
    Ok(vectors)
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /rerank handler

use crate::api::http_server::RerankState;
use crate::api::rerank::{RerankRequest, RerankResponse, RerankResult};
use crate::api::ApiError;
use crate::rerank::rank_by_score;
use axum::{extract::State, Json};
use std::time::Instant;
use tracing::debug;

/// POST /rerank handler
///
/// Scores every `(query, document.content)` pair, sorts by descending
/// score (stable for ties) and returns at most `top_k` documents.
///
/// # Request Body
/// ```json
/// {
///   "query": "query text",
///   "documents": [{ "id": "a", "content": "..." }],
///   "top_k": 5
/// }
/// ```
///
/// # Response Body
/// ```json
/// { "documents": [{ "id": "a", "content": "...", "score": 0.97 }] }
/// ```
pub async fn rerank_handler(
    State(state): State<RerankState>,
    Json(request): Json<RerankRequest>,
) -> Result<Json<RerankResponse>, ApiError> {
    let RerankRequest {
        query,
        documents,
        top_k,
    } = request;

    if documents.is_empty() || top_k == 0 {
        return Ok(Json(RerankResponse { documents: vec![] }));
    }

    let count = documents.len();
    let started = Instant::now();
    let contents = documents.iter().map(|doc| doc.content.clone()).collect();

    let scores = state
        .scorer
        .score_pairs(query, contents)
        .await
        .map_err(|e| ApiError::InferenceFailed(format!("{:#}", e)))?;

    let ranked = rank_by_score(documents, scores, top_k)
        .map_err(|e| ApiError::InferenceFailed(e.to_string()))?;

    debug!(
        documents = count,
        top_k,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Reranked documents"
    );

    Ok(Json(RerankResponse {
        documents: ranked.into_iter().map(RerankResult::from).collect(),
    }))
}

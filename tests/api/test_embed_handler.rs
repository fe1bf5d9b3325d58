// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed tests for the text embedding service
//!
//! These tests verify that:
//! - Every text gets one vector of the model's dimension
//! - Vectors are unit length and in input order
//! - Empty lists return empty vectors without calling the model
//! - Schema mismatches are rejected with 4xx
//! - Inference failures surface as a bare 500

use crate::common::{l2_norm, post_json, FailingEmbedder, HashEmbedder, NanEmbedder};
use axum::http::StatusCode;
use rag_model_api::api::{create_embed_app, EmbedResponse, EmbedState};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn app_with(embedder: Arc<HashEmbedder>) -> axum::Router {
    create_embed_app(EmbedState {
        service: "Embedding API",
        embedder,
    })
}

#[tokio::test]
async fn test_embed_returns_one_vector_per_text() {
    let app = app_with(Arc::new(HashEmbedder::new(16)));

    let (status, body) = post_json(
        app,
        "/embed",
        r#"{"texts": ["first text", "second text", "third text"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: EmbedResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.dimension, 16);
    assert_eq!(response.vectors.len(), 3);
    for vector in &response.vectors {
        assert_eq!(vector.len(), 16);
        assert!((l2_norm(vector) - 1.0).abs() < 1e-4, "vector must be unit length");
    }
}

#[tokio::test]
async fn test_embed_preserves_input_order() {
    let app = app_with(Arc::new(HashEmbedder::new(8)));
    let (_, forward) = post_json(app, "/embed", r#"{"texts": ["alpha", "beta"]}"#).await;

    let app = app_with(Arc::new(HashEmbedder::new(8)));
    let (_, reversed) = post_json(app, "/embed", r#"{"texts": ["beta", "alpha"]}"#).await;

    let forward: EmbedResponse = serde_json::from_value(forward).unwrap();
    let reversed: EmbedResponse = serde_json::from_value(reversed).unwrap();

    assert_ne!(forward.vectors[0], forward.vectors[1]);
    assert_eq!(forward.vectors[0], reversed.vectors[1]);
    assert_eq!(forward.vectors[1], reversed.vectors[0]);
}

#[tokio::test]
async fn test_embed_empty_list_returns_empty_vectors() {
    let embedder = Arc::new(HashEmbedder::new(32));
    let app = app_with(embedder.clone());

    let (status, body) = post_json(app, "/embed", r#"{"texts": []}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: EmbedResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.dimension, 32);
    assert!(response.vectors.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0, "model must not be called");
}

#[tokio::test]
async fn test_embed_accepts_empty_string() {
    let app = app_with(Arc::new(HashEmbedder::new(4)));

    let (status, body) = post_json(app, "/embed", r#"{"texts": [""]}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: EmbedResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.vectors.len(), 1);
}

#[tokio::test]
async fn test_embed_missing_field_is_422() {
    let app = app_with(Arc::new(HashEmbedder::new(4)));

    let (status, _) = post_json(app, "/embed", r#"{"text": ["wrong field"]}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_embed_wrong_type_is_422() {
    let app = app_with(Arc::new(HashEmbedder::new(4)));

    let (status, _) = post_json(app, "/embed", r#"{"texts": "not a list"}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_embed_malformed_json_is_client_error() {
    let app = app_with(Arc::new(HashEmbedder::new(4)));

    let (status, _) = post_json(app, "/embed", r#"{"texts": ["unterminated"#).await;

    assert!(status.is_client_error(), "got {}", status);
}

#[tokio::test]
async fn test_embed_inference_failure_is_500() {
    let app = create_embed_app(EmbedState {
        service: "Embedding API",
        embedder: Arc::new(FailingEmbedder),
    });

    let (status, body) = post_json(app, "/embed", r#"{"texts": ["hello"]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // No body, so internal error text never reaches the client
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_embed_nan_vector_is_500() {
    let app = create_embed_app(EmbedState {
        service: "Embedding API",
        embedder: Arc::new(NanEmbedder),
    });

    let (status, body) = post_json(app, "/embed", r#"{"texts": ["hello"]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_embed_rejects_get() {
    let app = app_with(Arc::new(HashEmbedder::new(4)));

    let (status, _) = crate::common::get(app, "/embed").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

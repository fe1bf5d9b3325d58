// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed tests for the context embedding service
//!
//! The request is a bare `[{id, content}]` array and the response echoes
//! each record with its vector, in the same order.

use crate::common::{l2_norm, post_json, FailingEmbedder, HashEmbedder};
use axum::http::StatusCode;
use rag_model_api::api::{create_context_embed_app, ConvertContext, EmbedState};
use std::sync::Arc;

fn app(dimension: usize) -> axum::Router {
    create_context_embed_app(EmbedState {
        service: "Context Embedding API",
        embedder: Arc::new(HashEmbedder::new(dimension)),
    })
}

#[tokio::test]
async fn test_contexts_keep_ids_and_order() {
    let (status, body) = post_json(
        app(12),
        "/embed",
        r#"[
            {"id": 30, "content": "third passage"},
            {"id": 10, "content": "first passage"},
            {"id": 20, "content": "second passage"}
        ]"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let contexts: Vec<ConvertContext> = serde_json::from_value(body).unwrap();

    let ids: Vec<i64> = contexts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![30, 10, 20]);
    assert_eq!(contexts[1].content, "first passage");
    for context in &contexts {
        assert_eq!(context.vector.len(), 12);
        assert!((l2_norm(&context.vector) - 1.0).abs() < 1e-4);
    }
}

#[tokio::test]
async fn test_same_content_same_vector() {
    let (_, body) = post_json(
        app(6),
        "/embed",
        r#"[{"id": 1, "content": "dup"}, {"id": 2, "content": "dup"}]"#,
    )
    .await;

    let contexts: Vec<ConvertContext> = serde_json::from_value(body).unwrap();
    assert_eq!(contexts[0].vector, contexts[1].vector);
    assert_ne!(contexts[0].id, contexts[1].id);
}

#[tokio::test]
async fn test_empty_context_list() {
    let (status, body) = post_json(app(6), "/embed", "[]").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_missing_content_is_422() {
    let (status, _) = post_json(app(6), "/embed", r#"[{"id": 1}]"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_object_body_is_422() {
    // The text-embedding shape is not accepted by the context service
    let (status, _) = post_json(app(6), "/embed", r#"{"texts": ["a"]}"#).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_inference_failure_is_500() {
    let app = create_context_embed_app(EmbedState {
        service: "Context Embedding API",
        embedder: Arc::new(FailingEmbedder),
    });

    let (status, _) = post_json(app, "/embed", r#"[{"id": 1, "content": "x"}]"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /rerank tests
//!
//! These tests verify that:
//! - Output length is min(top_k, number of documents)
//! - Scores are non-increasing
//! - top_k defaults to 5
//! - Every document appears exactly once when top_k covers all of them
//! - Ties keep their input order
//! - Schema and inference failures map to 422 and 500

use crate::common::{post_json, FailingScorer, NanScorer, OverlapScorer, ShortScorer};
use axum::http::StatusCode;
use rag_model_api::api::{create_rerank_app, RerankResponse, RerankState};
use rag_model_api::rerank::PairScorer;
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn app_with(scorer: Arc<dyn PairScorer>) -> axum::Router {
    create_rerank_app(RerankState {
        service: "Reranker API",
        scorer,
    })
}

fn documents(count: usize) -> serde_json::Value {
    // doc-i contains the first i query words, so higher i ranks higher
    let words = ["rust", "onnx", "cross", "encoder", "rerank", "score", "query", "model"];
    (0..count)
        .map(|i| {
            json!({
                "id": format!("doc-{}", i),
                "content": words[..i.min(words.len())].join(" "),
            })
        })
        .collect()
}

const QUERY: &str = "rust onnx cross encoder rerank score query model";

#[tokio::test]
async fn test_rerank_sorts_descending_and_truncates() {
    let body = json!({ "query": QUERY, "documents": documents(6), "top_k": 3 });

    let (status, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let response: RerankResponse = serde_json::from_value(response).unwrap();
    let ids: Vec<&str> = response.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["doc-5", "doc-4", "doc-3"]);
    assert!(response
        .documents
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
}

#[tokio::test]
async fn test_rerank_default_top_k_is_five() {
    let body = json!({ "query": QUERY, "documents": documents(8) });

    let (status, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    let response: RerankResponse = serde_json::from_value(response).unwrap();
    assert_eq!(response.documents.len(), 5);
}

#[tokio::test]
async fn test_rerank_top_k_covers_all_documents() {
    let body = json!({ "query": QUERY, "documents": documents(4), "top_k": 10 });

    let (_, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    let response: RerankResponse = serde_json::from_value(response).unwrap();
    assert_eq!(response.documents.len(), 4);

    let ids: HashSet<&str> = response.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids.len(), 4, "every document exactly once");
    for i in 0..4 {
        assert!(ids.contains(format!("doc-{}", i).as_str()));
    }
}

#[tokio::test]
async fn test_rerank_ties_keep_input_order() {
    let body = json!({
        "query": "rust",
        "documents": [
            {"id": "b", "content": "nothing relevant"},
            {"id": "a", "content": "rust"},
            {"id": "c", "content": "also nothing"},
            {"id": "d", "content": "more rust"}
        ],
        "top_k": 4
    });

    let (_, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    let response: RerankResponse = serde_json::from_value(response).unwrap();
    let ids: Vec<&str> = response.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "d", "b", "c"]);
}

#[tokio::test]
async fn test_rerank_echoes_content() {
    let body = json!({
        "query": "rust",
        "documents": [{"id": "only", "content": "Rust rocks"}],
    });

    let (_, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    let response: RerankResponse = serde_json::from_value(response).unwrap();
    assert_eq!(response.documents[0].id, "only");
    assert_eq!(response.documents[0].content, "Rust rocks");
    assert_eq!(response.documents[0].score, 1.0);
}

#[tokio::test]
async fn test_rerank_empty_documents() {
    let scorer = Arc::new(OverlapScorer::new());
    let body = json!({ "query": QUERY, "documents": [] });

    let (status, response) = post_json(app_with(scorer.clone()), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "documents": [] }));
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rerank_top_k_zero() {
    let body = json!({ "query": QUERY, "documents": documents(3), "top_k": 0 });

    let (status, response) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "documents": [] }));
}

#[tokio::test]
async fn test_rerank_missing_query_is_422() {
    let body = json!({ "documents": documents(2) });

    let (status, _) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_rerank_negative_top_k_is_422() {
    let body = json!({ "query": QUERY, "documents": documents(2), "top_k": -1 });

    let (status, _) =
        post_json(app_with(Arc::new(OverlapScorer::new())), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_rerank_inference_failure_is_500() {
    let body = json!({ "query": QUERY, "documents": documents(2) });

    let (status, response) =
        post_json(app_with(Arc::new(FailingScorer)), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, serde_json::Value::Null);
}

#[tokio::test]
async fn test_rerank_score_count_mismatch_is_500() {
    let body = json!({ "query": QUERY, "documents": documents(3) });

    let (status, response) =
        post_json(app_with(Arc::new(ShortScorer)), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, serde_json::Value::Null);
}

#[tokio::test]
async fn test_rerank_nan_score_is_500() {
    let body = json!({ "query": QUERY, "documents": documents(2) });

    let (status, response) =
        post_json(app_with(Arc::new(NanScorer)), "/rerank", &body.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, serde_json::Value::Null);
}

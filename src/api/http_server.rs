// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::embed::{embed_contexts_handler, embed_handler};
use super::rerank::rerank_handler;
use crate::embeddings::TextEmbedder;
use crate::rerank::PairScorer;

/// Shared state of both embedding services
///
/// The model is loaded once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct EmbedState {
    pub service: &'static str,
    pub embedder: Arc<dyn TextEmbedder>,
}

/// Shared state of the reranker service
#[derive(Clone)]
pub struct RerankState {
    pub service: &'static str,
    pub scorer: Arc<dyn PairScorer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub model: String,
}

impl HealthResponse {
    fn healthy(service: &str, model: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
            model: model.to_string(),
        }
    }
}

/// Router for the text embedding service: POST /embed, GET /health
pub fn create_embed_app(state: EmbedState) -> Router {
    Router::new()
        .route("/health", get(embed_health_handler))
        .route("/embed", post(embed_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router for the context embedding service: POST /embed, GET /health
pub fn create_context_embed_app(state: EmbedState) -> Router {
    Router::new()
        .route("/health", get(embed_health_handler))
        .route("/embed", post(embed_contexts_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router for the reranker service: POST /rerank, GET /health
pub fn create_rerank_app(state: RerankState) -> Router {
    Router::new()
        .route("/health", get(rerank_health_handler))
        .route("/rerank", post(rerank_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn embed_health_handler(State(state): State<EmbedState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(state.service, state.embedder.model_name()))
}

async fn rerank_health_handler(State(state): State<RerankState>) -> impl IntoResponse {
    Json(HealthResponse::healthy(state.service, state.scorer.model_name()))
}

/// Binds `host:port` and serves `app` until Ctrl+C / SIGTERM
pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

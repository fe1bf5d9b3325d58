// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service startup shared by the three binaries
//!
//! Every flag can also be set through its environment variable (or a
//! `.env` file), so containers only need `MODEL_NAME`.

use crate::api::{self, EmbedState, RerankState};
use crate::embeddings::{OnnxEmbeddingModel, Pooling, TextEmbedder};
use crate::inference::LoadOptions;
use crate::models::{resolve_model_files, ModelRole, ModelSource};
use crate::rerank::{OnnxCrossEncoder, PairScorer};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-base-en-v1.5";
pub const DEFAULT_RERANKER_MODEL: &str = "BAAI/bge-reranker-base";

/// Model API server options
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Serve an ONNX embedding or reranker model over HTTP", long_about = None)]
pub struct ServeArgs {
    /// HuggingFace repo id or local model directory
    #[arg(long, env = "MODEL_NAME")]
    pub model_name: Option<String>,

    /// Hub revision (branch, tag or commit)
    #[arg(long, env = "MODEL_REVISION", default_value = "main")]
    pub model_revision: String,

    /// ONNX graph path inside the model repo
    #[arg(long, env = "ONNX_FILE", default_value = "onnx/model.onnx")]
    pub onnx_file: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Maximum tokens per input after truncation
    #[arg(long, env = "MAX_SEQUENCE_LENGTH", default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_length: u32,

    /// Texts (or pairs) per ONNX session run
    #[arg(long, env = "BATCH_SIZE", default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "INTRA_THREADS", default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub intra_threads: u32,

    /// Override the pooling declared by the model (embedding services only)
    #[arg(long, env = "POOLING", value_enum)]
    pub pooling: Option<Pooling>,
}

impl ServeArgs {
    pub fn model_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_name.as_deref().unwrap_or(default)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_length: self.max_length as usize,
            batch_size: self.batch_size as usize,
            intra_threads: self.intra_threads as usize,
        }
    }
}

/// The three services this crate ships
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// `{"texts": [...]}` → `{dimension, vectors}`
    Embedding,
    /// `[{id, content}]` → `[{id, content, vector}]`
    ContextEmbedding,
    /// `{query, documents, top_k}` → `{documents: [{id, content, score}]}`
    Reranker,
}

impl Service {
    pub fn title(&self) -> &'static str {
        match self {
            Service::Embedding => "Embedding API",
            Service::ContextEmbedding => "Context Embedding API",
            Service::Reranker => "Reranker API",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Service::Embedding | Service::ContextEmbedding => DEFAULT_EMBEDDING_MODEL,
            Service::Reranker => DEFAULT_RERANKER_MODEL,
        }
    }

    pub fn model_role(&self) -> ModelRole {
        match self {
            Service::Embedding | Service::ContextEmbedding => ModelRole::Embedder,
            Service::Reranker => ModelRole::CrossEncoder,
        }
    }
}

/// Installs the fmt subscriber, defaulting to `info` when RUST_LOG is unset
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads the service's model, then serves it until shutdown
pub async fn run(service: Service, args: ServeArgs) -> Result<()> {
    let model_name = args.model_name_or(service.default_model()).to_string();
    info!(
        "Starting {} ({}) with model {}",
        service.title(),
        crate::version::get_version_string(),
        model_name
    );
    debug!("Features: {}", crate::version::FEATURES.join(", "));

    let source = ModelSource::parse(&model_name, &args.model_revision);
    let files = resolve_model_files(&source, &args.onnx_file, service.model_role())
        .await
        .with_context(|| format!("Failed to resolve model {}", model_name))?;
    let options = args.load_options();

    let app = match service {
        Service::Embedding | Service::ContextEmbedding => {
            let pooling = args.pooling;
            let name = model_name.clone();
            let model = tokio::task::spawn_blocking(move || {
                OnnxEmbeddingModel::load(name, &files, &options, pooling)
            })
            .await
            .context("Model loading task panicked")??;

            let state = EmbedState {
                service: service.title(),
                embedder: Arc::new(model) as Arc<dyn TextEmbedder>,
            };
            if service == Service::Embedding {
                api::create_embed_app(state)
            } else {
                api::create_context_embed_app(state)
            }
        }
        Service::Reranker => {
            let name = model_name.clone();
            let model = tokio::task::spawn_blocking(move || {
                OnnxCrossEncoder::load(name, &files, &options)
            })
            .await
            .context("Model loading task panicked")??;

            api::create_rerank_app(RerankState {
                service: service.title(),
                scorer: Arc::new(model) as Arc<dyn PairScorer>,
            })
        }
    };

    api::serve(app, &args.host, args.port).await
}

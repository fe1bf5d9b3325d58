// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod http_server;
pub mod rerank;

pub use embed::{
    embed_contexts_handler, embed_handler, Context, ConvertContext, EmbedRequest, EmbedResponse,
};
pub use errors::ApiError;
pub use http_server::{
    create_context_embed_app, create_embed_app, create_rerank_app, serve, EmbedState,
    HealthResponse, RerankState,
};
pub use rerank::{rerank_handler, Document, RerankRequest, RerankResponse, RerankResult};

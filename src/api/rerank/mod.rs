// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Reranker API Module
//!
//! POST /rerank: scores documents against a query with a cross-encoder and
//! returns the top_k by descending score.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::rerank_handler;
pub use request::{Document, RerankRequest};
pub use response::{RerankResponse, RerankResult};

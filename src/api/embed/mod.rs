// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! POST /embed in two shapes: `{"texts": [...]}` returning
//! `{dimension, vectors}`, and a bare `[{id, content}]` list returning each
//! record tagged with its vector.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{embed_contexts_handler, embed_handler};
pub use request::{Context, EmbedRequest};
pub use response::{ConvertContext, EmbedResponse};

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use tracing::error;

/// Failure while serving a request that passed schema validation
///
/// The detail is only logged; clients get a bare 500.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Tokenization, ONNX Runtime or output reshaping failed
    InferenceFailed(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InferenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{}", self);
        self.status_code().into_response()
    }
}

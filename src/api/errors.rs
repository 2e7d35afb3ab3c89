// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP mapping of pipeline errors

use crate::vectorizer::{InvalidInput, VectorizerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by every failing endpoint
///
/// # Example
/// ```json
/// { "detail": "Text at index 1 cannot be empty", "errorType": "invalid_input" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

/// A pipeline error on its way out of an HTTP handler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(transparent)]
pub struct ApiError(#[from] pub VectorizerError);

impl From<InvalidInput> for ApiError {
    fn from(err: InvalidInput) -> Self {
        ApiError(err.into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            // Caller error; never retried by the service
            VectorizerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            VectorizerError::ModelInvocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            detail: self.to_string(),
            error_type: self.0.kind().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

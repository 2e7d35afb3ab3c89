// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the embedding pipeline
//!
//! Two failure kinds reach the request boundary:
//! - `InvalidInput`: the caller sent a batch that cannot be embedded
//! - `ModelInvocation`: the model failed or returned an unusable batch

use thiserror::Error;

/// Reasons a batch is rejected before the model is called
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// The `texts` array has no elements
    #[error("Texts array cannot be empty")]
    EmptyBatch,

    /// The text at `index` is empty or whitespace-only
    #[error("Text at index {index} cannot be empty")]
    EmptyText { index: usize },
}

/// Errors produced while turning a batch of texts into encoded embeddings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorizerError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Carries the underlying cause message
    #[error("Failed to generate embeddings: {0}")]
    ModelInvocation(String),
}

impl VectorizerError {
    /// Short machine-readable tag used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            VectorizerError::InvalidInput(_) => "invalid_input",
            VectorizerError::ModelInvocation(_) => "model_invocation_error",
        }
    }
}

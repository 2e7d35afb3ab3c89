// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding pipeline: validate, invoke the model once, encode
//!
//! ```text
//! texts -> validate_texts -> EmbeddingInvoker -> encode_batch -> Vec<EncodedEmbedding>
//! ```
//! A request either yields one encoded embedding per text, in request order,
//! or fails as a whole with a single [`VectorizerError`].

pub mod codec;
pub mod errors;
pub mod health;
pub mod invoker;
pub mod validator;

pub use codec::{decode_embedding, encode_batch, encode_embedding, DecodeError, EncodedEmbedding};
pub use errors::{InvalidInput, VectorizerError};
pub use health::{HealthReporter, HealthStatus, ServiceInfo};
pub use invoker::EmbeddingInvoker;
pub use validator::validate_texts;

use crate::embeddings::EmbeddingModel;
use std::sync::Arc;
use tracing::warn;

/// Immutable per-process service built once at startup
#[derive(Debug, Clone)]
pub struct VectorizerService {
    invoker: EmbeddingInvoker,
    health: HealthReporter,
}

impl VectorizerService {
    /// Wraps a loaded model; the health snapshot is taken here, once
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        let health = HealthReporter::new(model.model_name(), model.dimension());
        Self {
            invoker: EmbeddingInvoker::new(model),
            health,
        }
    }

    pub fn health(&self) -> &HealthReporter {
        &self.health
    }

    /// Runs the full pipeline for one request
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<EncodedEmbedding>, VectorizerError> {
        if let Err(e) = validate_texts(texts) {
            warn!("Rejected embed request: {}", e);
            return Err(e.into());
        }

        let vectors = self.invoker.invoke(texts).await?;
        Ok(encode_batch(&vectors))
    }
}

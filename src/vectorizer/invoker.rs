// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch invocation contract around an [`EmbeddingModel`]

use super::errors::VectorizerError;
use crate::embeddings::EmbeddingModel;
use std::sync::Arc;
use tracing::{debug, error};

/// Calls the model once per request and checks the shape of what comes back
///
/// Input is trusted to be validated already. Failures are never retried
/// here; callers may retry at the HTTP layer.
#[derive(Clone)]
pub struct EmbeddingInvoker {
    model: Arc<dyn EmbeddingModel>,
}

impl EmbeddingInvoker {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    /// Embeds `texts` in one model call
    ///
    /// # Returns
    /// - `Ok(vectors)`: one vector per text, same order, each of the model's dimension
    /// - `Err(VectorizerError::ModelInvocation)`: the model failed, returned the
    ///   wrong number of vectors, or a vector of the wrong length
    pub async fn invoke(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, VectorizerError> {
        debug!(batch_size = texts.len(), model = %self.model.model_name(), "Invoking embedding model");

        let vectors = self.model.embed_batch(texts).await.map_err(|e| {
            error!("Error generating embeddings: {:#}", e);
            VectorizerError::ModelInvocation(format!("{:#}", e))
        })?;

        if vectors.len() != texts.len() {
            error!(
                "Model returned {} embeddings for {} texts",
                vectors.len(),
                texts.len()
            );
            return Err(VectorizerError::ModelInvocation(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let dimension = self.model.dimension();
        if let Some((index, vector)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            error!(
                "Embedding at index {} has {} dimensions, model reports {}",
                index,
                vector.len(),
                dimension
            );
            return Err(VectorizerError::ModelInvocation(format!(
                "embedding at index {} has dimension {} (expected {})",
                index,
                vector.len(),
                dimension
            )));
        }

        Ok(vectors)
    }
}

impl std::fmt::Debug for EmbeddingInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingInvoker")
            .field("model", &self.model.model_name())
            .field("dimension", &self.model.dimension())
            .finish()
    }
}

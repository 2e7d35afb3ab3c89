// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedResponse type for POST /embed

use crate::vectorizer::EncodedEmbedding;
use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// # Example
/// ```json
/// {
///   "embeddings": [
///     { "embedding": "AACAPwAAAEA=", "dimension": 2 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedResponse {
    /// One entry per request text, in request order
    pub embeddings: Vec<EncodedEmbedding>,
}

impl EmbedResponse {
    /// Returns the number of embeddings in the response
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Shared dimension of every embedding, `None` when empty or inconsistent
    pub fn dimension(&self) -> Option<usize> {
        let first = self.embeddings.first()?.dimension;
        self.embeddings
            .iter()
            .all(|e| e.dimension == first)
            .then_some(first)
    }
}

impl From<Vec<EncodedEmbedding>> for EmbedResponse {
    fn from(embeddings: Vec<EncodedEmbedding>) -> Self {
        Self { embeddings }
    }
}

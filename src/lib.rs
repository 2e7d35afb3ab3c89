// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod client;
pub mod config;
pub mod embeddings;
pub mod vectorizer;
pub mod version;

pub use api::{create_app, AppState};
pub use client::{ClientError, VectorizerClient};
pub use config::{ConfigError, VectorizerConfig};
pub use embeddings::{EmbeddingModel, HashEmbeddingModel, OnnxEmbeddingModel};
pub use vectorizer::{EncodedEmbedding, VectorizerError, VectorizerService};

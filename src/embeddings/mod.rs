// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding models
//!
//! The service only ever talks to a model through [`EmbeddingModel`]. The
//! production implementation is [`OnnxEmbeddingModel`]; [`HashEmbeddingModel`]
//! is a deterministic in-process stand-in used by tests and benchmarks.

pub mod hash_model;
pub mod model_source;
pub mod onnx_model;
pub mod pipeline;

use anyhow::Result;
use async_trait::async_trait;

pub use hash_model::HashEmbeddingModel;
pub use model_source::ModelSource;
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions};
pub use pipeline::{PipelineConfig, PoolingMode};

/// A loaded text embedding model
///
/// Implementations are constructed once at startup and shared read-only
/// across requests. Models that cannot run concurrently must serialize
/// `embed_batch` internally.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds a whole batch in a single model call
    ///
    /// The returned vectors are in the same order as `texts`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Fixed length of every vector this model produces
    fn dimension(&self) -> usize;

    /// Identifier the model was loaded under
    fn model_name(&self) -> &str;
}

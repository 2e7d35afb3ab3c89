// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use fabstir_vectorizer::{
    api::{start_server, AppState},
    config::VectorizerConfig,
    embeddings::{EmbeddingModel, ModelSource, OnnxEmbeddingModel},
    vectorizer::VectorizerService,
    version,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Exits with a usage error when MODEL_NAME is missing
    let config = VectorizerConfig::parse();
    config.validate()?;

    // Initialize tracing subscriber for logging
    let filter = EnvFilter::try_new(config.log_level.to_lowercase())
        .with_context(|| format!("Invalid LOG_LEVEL '{}'", config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting {}", version::get_version_string());

    // The process must not serve traffic unless the model loads
    info!("Loading model: {}", config.model_name);
    let source = ModelSource::resolve(&config.model_name, &config.onnx_file, &config.tokenizer_file)
        .await
        .with_context(|| format!("Failed to locate model {}", config.model_name))?;

    let options = config.model_options(&source.pipeline);
    info!(
        "Pooling: {:?}, normalize: {}, max sequence length: {}",
        options.pooling, options.normalize, options.max_length
    );
    let model = OnnxEmbeddingModel::new(
        config.model_name.clone(),
        source.onnx_path,
        source.tokenizer_path,
        options,
    )
    .await
    .with_context(|| format!("Failed to load model {}", config.model_name))?;

    info!("Model loaded. Embedding dimension: {}", model.dimension());

    let service = VectorizerService::new(Arc::new(model));
    start_server(&config.bind_addr(), AppState::new(service)).await
}

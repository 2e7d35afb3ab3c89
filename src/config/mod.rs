// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration
//!
//! Read once at startup from command-line flags, falling back to environment
//! variables (and a `.env` file loaded by `main`). `MODEL_NAME` is the only
//! required setting; everything else has a documented default.
//!
//! Pooling, normalization and max sequence length default to what the model
//! repo's sentence-transformers files say; setting them here overrides that.

use crate::embeddings::{OnnxModelOptions, PipelineConfig, PoolingMode};
use clap::Parser;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_ONNX_FILE: &str = "onnx/model.onnx";
pub const DEFAULT_TOKENIZER_FILE: &str = "tokenizer.json";
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;
pub const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MODEL_NAME must be set to a model directory or Hugging Face repo id")]
    MissingModelName,

    #[error("HOST must not be empty")]
    EmptyHost,

    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },
}

/// Vectorizer service configuration
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "fabstir-vectorizer")]
#[command(about = "Batch text-embedding service", long_about = None)]
pub struct VectorizerConfig {
    /// Local model directory or Hugging Face repo id (e.g. sentence-transformers/all-MiniLM-L6-v2)
    #[arg(long, env = "MODEL_NAME")]
    pub model_name: String,

    /// Log verbosity (error, warn, info, debug, trace) or a tracing filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// ONNX graph path inside the model directory/repo
    #[arg(long, env = "ONNX_FILE", default_value = DEFAULT_ONNX_FILE)]
    pub onnx_file: String,

    /// Tokenizer path inside the model directory/repo
    #[arg(long, env = "TOKENIZER_FILE", default_value = DEFAULT_TOKENIZER_FILE)]
    pub tokenizer_file: String,

    /// Texts are truncated to this many tokens [default: model's max_seq_length, else 512]
    #[arg(long, env = "MAX_SEQUENCE_LENGTH")]
    pub max_sequence_length: Option<usize>,

    /// L2-normalize embeddings before encoding [default: whether the model has a Normalize module]
    #[arg(long, env = "NORMALIZE_EMBEDDINGS")]
    pub normalize: Option<bool>,

    /// Token pooling strategy [default: model's pooling config, else mean]
    #[arg(long, env = "POOLING_MODE", value_enum)]
    pub pooling: Option<PoolingMode>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "INTRA_THREADS", default_value_t = DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,
}

impl VectorizerConfig {
    /// Config for `model_name` with every other field at its default
    pub fn with_model(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            onnx_file: DEFAULT_ONNX_FILE.to_string(),
            tokenizer_file: DEFAULT_TOKENIZER_FILE.to_string(),
            max_sequence_length: None,
            normalize: None,
            pooling: None,
            intra_threads: DEFAULT_INTRA_THREADS,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::MissingModelName);
        }
        if self.port == 0 {
            return Err(ConfigError::Zero { field: "port" });
        }
        if self.max_sequence_length == Some(0) {
            return Err(ConfigError::Zero {
                field: "max_sequence_length",
            });
        }
        if self.intra_threads == 0 {
            return Err(ConfigError::Zero {
                field: "intra_threads",
            });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(())
    }

    /// Model runtime options: explicit settings first, then the repo's
    /// pipeline files, then built-in defaults
    pub fn model_options(&self, pipeline: &PipelineConfig) -> OnnxModelOptions {
        OnnxModelOptions {
            max_length: self
                .max_sequence_length
                .or(pipeline.max_seq_length)
                .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH),
            normalize: self.normalize.or(pipeline.normalize).unwrap_or(false),
            pooling: self.pooling.or(pipeline.pooling).unwrap_or_default(),
            lowercase: pipeline.do_lower_case,
            intra_threads: self.intra_threads,
        }
    }

    /// `host:port` the HTTP server binds to; host names are resolved at bind time
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs a sentence-transformer style ONNX graph with ONNX Runtime.
//!
//! Features:
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - Tokenization with truncation, batch padding to the longest sequence
//! - One session run per batch
//! - Attention-masked pooling over token embeddings (mean, CLS, max, ...)
//! - Embedding dimension discovered from the graph at load time

use super::pipeline::PoolingMode;
use super::EmbeddingModel;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, ArrayViewD, Axis};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// Input name some exported graphs omit (e.g. DistilBERT based models)
const TOKEN_TYPE_IDS: &str = "token_type_ids";

/// Runtime knobs for [`OnnxEmbeddingModel`]
#[derive(Debug, Clone)]
pub struct OnnxModelOptions {
    /// Texts longer than this many tokens are truncated
    pub max_length: usize,
    /// L2-normalize every output vector
    pub normalize: bool,
    /// Reduction applied to `[batch, seq_len, hidden]` outputs
    pub pooling: PoolingMode,
    /// Lowercase texts before tokenizing
    pub lowercase: bool,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            max_length: 512,
            normalize: false,
            pooling: PoolingMode::Mean,
            lowercase: false,
            intra_threads: 4,
        }
    }
}

/// ONNX-based embedding model
///
/// # Thread Safety
/// ONNX Runtime sessions are run through `&mut`, so the session sits behind a
/// mutex and batches are serialized. All fields are wrapped in Arc for cheap
/// cloning into blocking tasks.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    /// ONNX Runtime session (wrapped in Arc<Mutex> for thread-safe shared access)
    session: Arc<Mutex<Session>>,

    tokenizer: Arc<Tokenizer>,

    model_name: String,

    /// Output dimension, probed once at load
    dimension: usize,

    /// Whether the graph declares a `token_type_ids` input
    uses_token_type_ids: bool,

    options: OnnxModelOptions,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("uses_token_type_ids", &self.uses_token_type_ids)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads an ONNX model and its tokenizer from disk
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference fails or yields an unsupported output shape
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "sentence-transformers/all-MiniLM-L6-v2",
    ///     "/models/all-MiniLM-L6-v2/onnx/model.onnx",
    ///     "/models/all-MiniLM-L6-v2/tokenizer.json",
    ///     OnnxModelOptions::default(),
    /// ).await?;
    /// ```
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        options: OnnxModelOptions,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref().to_path_buf();
        let tokenizer_path = tokenizer_path.as_ref().to_path_buf();

        tokio::task::spawn_blocking(move || {
            Self::load(model_name, model_path, tokenizer_path, options)
        })
        .await
        .context("Model loading task failed")?
    }

    fn load(
        model_name: String,
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        options: OnnxModelOptions,
    ) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("🚀 Initializing ONNX embedding model {}", model_name);
        let mut session = build_session(&model_path, options.intra_threads)?;

        let uses_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == TOKEN_TYPE_IDS);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        // Padding is applied per batch below
        tokenizer.with_padding(None);

        // Discover the output dimension with a probe inference
        let probe = run_session(
            &mut session,
            &tokenizer,
            uses_token_type_ids,
            &options,
            &["validation test".to_string()],
        )
        .context("Probe inference failed")?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            anyhow::bail!("Model produced an empty embedding during validation");
        }

        info!(
            "✅ ONNX embedding model loaded: {} ({} dimensions)",
            model_name, dimension
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
            uses_token_type_ids,
            options,
        })
    }

    /// Embeds a batch on the calling thread
    ///
    /// Blocks for the duration of the ONNX run; async callers go through
    /// [`EmbeddingModel::embed_batch`], which moves this onto the blocking pool.
    pub fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
            run_session(
                &mut session,
                &self.tokenizer,
                self.uses_token_type_ids,
                &self.options,
                texts,
            )?
        };

        for (i, emb) in embeddings.iter_mut().enumerate() {
            if emb.len() != self.dimension {
                anyhow::bail!(
                    "Unexpected embedding dimension at index {}: {} (expected {})",
                    i,
                    emb.len(),
                    self.dimension
                );
            }
            if self.options.normalize {
                l2_normalize(emb);
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingModel for OnnxEmbeddingModel {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_batch_blocking(&texts))
            .await
            .context("Embedding task failed")?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Builds a session, trying CUDA first and falling back to CPU
fn build_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    debug!("Attempting CUDA execution provider");
    let cuda_result = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CUDAExecutionProvider::default().build()])
        .context("Failed to set CUDA execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path);

    match cuda_result {
        Ok(session) => {
            info!("✅ CUDA execution provider initialized");
            Ok(session)
        }
        Err(e) => {
            warn!("⚠️  CUDA execution provider failed: {}", e);
            warn!("   Falling back to CPU execution provider");
            Session::builder()
                .context("Failed to create session builder")?
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .context("Failed to set optimization level")?
                .with_intra_threads(intra_threads)
                .context("Failed to set intra threads")?
                .commit_from_file(model_path)
                .with_context(|| {
                    format!("Failed to load ONNX model from {}", model_path.display())
                })
        }
    }
}

/// Tokenizes, pads and runs one batch through the session
fn run_session(
    session: &mut Session,
    tokenizer: &Tokenizer,
    uses_token_type_ids: bool,
    options: &OnnxModelOptions,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let encodings = texts
        .iter()
        .map(|text| {
            let encoded = if options.lowercase {
                tokenizer.encode(text.to_lowercase(), true)
            } else {
                tokenizer.encode(text.as_str(), true)
            };
            encoded.map_err(|e| anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(texts.len() * max_len);
    let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
    let mut token_type_ids = Vec::with_capacity(texts.len() * max_len);

    for encoding in &encodings {
        let ids = encoding.get_ids();
        let padding_needed = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));

        input_ids.extend(std::iter::repeat(0i64).take(padding_needed));
        attention_mask.extend(std::iter::repeat(0i64).take(padding_needed));
        token_type_ids.extend(std::iter::repeat(0i64).take(padding_needed));
    }

    let mask_for_pooling = attention_mask.clone();

    let shape = (texts.len(), max_len);
    let input_ids =
        Array2::from_shape_vec(shape, input_ids).context("Failed to create input_ids array")?;
    let attention_mask = Array2::from_shape_vec(shape, attention_mask)
        .context("Failed to create attention_mask array")?;
    let token_type_ids = Array2::from_shape_vec(shape, token_type_ids)
        .context("Failed to create token_type_ids array")?;

    let outputs = if uses_token_type_ids {
        session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids)?,
            "attention_mask" => Value::from_array(attention_mask)?,
            "token_type_ids" => Value::from_array(token_type_ids)?
        ])?
    } else {
        session.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids)?,
            "attention_mask" => Value::from_array(attention_mask)?
        ])?
    };

    // Different exports name their outputs differently; the first one is the embedding
    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;

    pool_output(output, &mask_for_pooling, texts.len(), max_len, options.pooling)
}

/// Turns the raw graph output into one vector per batch item
///
/// `[batch, seq_len, hidden]` outputs are pooled with `mode` over the tokens
/// whose attention mask is set; `[batch, hidden]` outputs are already
/// sentence embeddings and are returned row by row.
pub(crate) fn pool_output(
    output: ArrayViewD<'_, f32>,
    attention_mask: &[i64],
    batch_size: usize,
    max_len: usize,
    mode: PoolingMode,
) -> Result<Vec<Vec<f32>>> {
    let shape = output.shape().to_vec();
    if shape.first() != Some(&batch_size) {
        anyhow::bail!(
            "Model output batch size {:?} does not match input batch size {}",
            shape.first(),
            batch_size
        );
    }

    match shape.len() {
        2 => Ok(output
            .axis_iter(Axis(0))
            .map(|row| row.iter().copied().collect())
            .collect()),
        3 if shape[1] == 0 => anyhow::bail!("Model output has no token positions"),
        3 => {
            let seq_len = shape[1].min(max_len);
            let mut embeddings = Vec::with_capacity(batch_size);

            for batch_idx in 0..batch_size {
                let item = output.index_axis(Axis(0), batch_idx);
                let item_mask = &attention_mask[batch_idx * max_len..batch_idx * max_len + seq_len];
                let tokens = item
                    .axis_iter(Axis(0))
                    .zip(item_mask)
                    .filter(|(_, mask)| **mask != 0)
                    .map(|(token, _)| token);

                let hidden_dim = shape[2];
                let pooled = match mode {
                    PoolingMode::Cls => item.index_axis(Axis(0), 0).iter().copied().collect(),
                    PoolingMode::LastToken => match tokens.last() {
                        Some(token) => token.iter().copied().collect(),
                        None => vec![0.0; hidden_dim],
                    },
                    PoolingMode::Max => {
                        let mut pooled = vec![f32::NEG_INFINITY; hidden_dim];
                        let mut count = 0usize;
                        for token in tokens {
                            count += 1;
                            for (value, &x) in pooled.iter_mut().zip(token.iter()) {
                                *value = value.max(x);
                            }
                        }
                        if count == 0 {
                            pooled.fill(0.0);
                        }
                        pooled
                    }
                    PoolingMode::Mean | PoolingMode::MeanSqrtLen => {
                        let mut pooled = vec![0.0f32; hidden_dim];
                        let mut count = 0.0f32;
                        for token in tokens {
                            count += 1.0;
                            for (value, &x) in pooled.iter_mut().zip(token.iter()) {
                                *value += x;
                            }
                        }
                        let divisor = match mode {
                            PoolingMode::MeanSqrtLen => count.sqrt(),
                            _ => count,
                        }
                        .max(1e-9);
                        for value in &mut pooled {
                            *value /= divisor;
                        }
                        pooled
                    }
                };

                embeddings.push(pooled);
            }

            Ok(embeddings)
        }
        _ => anyhow::bail!(
            "Model outputs unexpected shape {:?} (expected [batch, seq_len, hidden] or [batch, hidden])",
            shape
        ),
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

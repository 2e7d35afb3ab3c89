// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Locating model files
//!
//! A model identifier is either a local directory holding the ONNX graph and
//! `tokenizer.json`, or a Hugging Face Hub repository id whose files are
//! fetched into the standard hub cache. The sentence-transformers pipeline
//! files are picked up alongside when the repo has them.

use super::pipeline::PipelineConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name looked up at the root of a local model directory when the
/// configured ONNX path is absent
const FLAT_ONNX_FILE: &str = "model.onnx";

/// Resolved on-disk paths of one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub onnx_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub pipeline: PipelineConfig,
}

impl ModelSource {
    /// Resolves `model_name` to local files, downloading them if needed
    ///
    /// # Arguments
    /// - `model_name`: local directory or hub repo id (e.g. "sentence-transformers/all-MiniLM-L6-v2")
    /// - `onnx_file`: path of the ONNX graph inside the directory/repo
    /// - `tokenizer_file`: path of the tokenizer JSON inside the directory/repo
    pub async fn resolve(model_name: &str, onnx_file: &str, tokenizer_file: &str) -> Result<Self> {
        let local = Path::new(model_name);
        if local.is_dir() {
            debug!(path = %local.display(), "Using local model directory");
            return Self::from_local_dir(local, onnx_file, tokenizer_file);
        }

        let repo_id = model_name.to_string();
        let onnx_file = onnx_file.to_string();
        let tokenizer_file = tokenizer_file.to_string();
        tokio::task::spawn_blocking(move || Self::download(&repo_id, &onnx_file, &tokenizer_file))
            .await
            .context("Model download task failed")?
    }

    /// Looks up model files inside an existing directory
    pub fn from_local_dir(dir: &Path, onnx_file: &str, tokenizer_file: &str) -> Result<Self> {
        let mut onnx_path = dir.join(onnx_file);
        if !onnx_path.exists() {
            onnx_path = dir.join(FLAT_ONNX_FILE);
        }
        if !onnx_path.exists() {
            anyhow::bail!(
                "ONNX model file not found in {} (tried {} and {})",
                dir.display(),
                onnx_file,
                FLAT_ONNX_FILE
            );
        }

        let tokenizer_path = dir.join(tokenizer_file);
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        Ok(Self {
            onnx_path,
            tokenizer_path,
            pipeline: PipelineConfig::from_dir(dir)?,
        })
    }

    /// Fetches model files from the Hugging Face Hub
    fn download(repo_id: &str, onnx_file: &str, tokenizer_file: &str) -> Result<Self> {
        use hf_hub::api::sync::Api;

        info!(repo = %repo_id, "Fetching model files from Hugging Face Hub");

        let api = Api::new().context("Failed to initialise Hugging Face Hub client")?;
        let repo = api.model(repo_id.to_string());

        let onnx_path = repo
            .get(onnx_file)
            .with_context(|| format!("Failed to fetch {} from {}", onnx_file, repo_id))?;
        let tokenizer_path = repo
            .get(tokenizer_file)
            .with_context(|| format!("Failed to fetch {} from {}", tokenizer_file, repo_id))?;

        debug!(onnx = %onnx_path.display(), tokenizer = %tokenizer_path.display(), "Model files cached");

        // Repos without sentence-transformers metadata answer 404 here
        let pipeline = PipelineConfig::load_with(|name| match repo.get(name) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(file = name, "Not fetched from {}: {}", repo_id, e);
                None
            }
        })?;

        Ok(Self {
            onnx_path,
            tokenizer_path,
            pipeline,
        })
    }
}

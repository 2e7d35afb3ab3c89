// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence-transformers pipeline settings
//!
//! Repos exported from sentence-transformers describe the post-processing
//! applied on top of the transformer output:
//! - `modules.json`: the module stack, including an optional `Normalize` step
//! - `<pooling module>/config.json`: which pooling strategy to use
//! - `sentence_bert_config.json`: `max_seq_length` and `do_lower_case`
//!
//! Every file is optional. Whatever is missing is left as `None` so that
//! explicit configuration or built-in defaults can fill it in.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MODULES_FILE: &str = "modules.json";
pub const SENTENCE_BERT_CONFIG_FILE: &str = "sentence_bert_config.json";
/// Pooling directory used by repos without `modules.json`
pub const DEFAULT_POOLING_DIR: &str = "1_Pooling";

const POOLING_MODULE_SUFFIX: &str = "Pooling";
const NORMALIZE_MODULE_SUFFIX: &str = "Normalize";

/// How token embeddings are reduced to one sentence vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PoolingMode {
    /// First token (`[CLS]`)
    Cls,
    /// Attention-masked average
    #[default]
    Mean,
    /// Attention-masked element-wise maximum
    Max,
    /// Masked sum divided by the square root of the token count
    MeanSqrtLen,
    /// Last non-padding token
    LastToken,
}

/// Settings read from a model repo, `None` where the repo says nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub pooling: Option<PoolingMode>,
    pub normalize: Option<bool>,
    pub max_seq_length: Option<usize>,
    pub do_lower_case: bool,
}

#[derive(Deserialize)]
struct ModuleEntry {
    #[serde(default)]
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PoolingFile {
    pooling_mode_cls_token: bool,
    pooling_mode_mean_tokens: bool,
    pooling_mode_max_tokens: bool,
    pooling_mode_mean_sqrt_len_tokens: bool,
    pooling_mode_lasttoken: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SentenceBertFile {
    max_seq_length: Option<usize>,
    do_lower_case: bool,
}

/// What `modules.json` says about the stack
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleStack {
    pooling_dir: Option<String>,
    normalize: bool,
}

impl PipelineConfig {
    /// Reads the settings from a local model directory
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::load_with(|name| {
            let path = dir.join(name);
            path.is_file().then_some(path)
        })
    }

    /// Reads the settings through `fetch`, which maps a repo-relative file
    /// name to a local path or `None` when the repo has no such file
    pub fn load_with<F>(fetch: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let mut config = Self::default();

        let stack = match fetch(MODULES_FILE) {
            Some(path) => Some(parse_modules(&read(&path)?)?),
            None => None,
        };
        if let Some(stack) = &stack {
            config.normalize = Some(stack.normalize);
        }

        let pooling_dir = match &stack {
            Some(stack) => stack.pooling_dir.clone(),
            None => Some(DEFAULT_POOLING_DIR.to_string()),
        };
        if let Some(dir) = pooling_dir {
            if let Some(path) = fetch(&format!("{}/config.json", dir)) {
                config.pooling = Some(parse_pooling(&read(&path)?)?);
            }
        }

        if let Some(path) = fetch(SENTENCE_BERT_CONFIG_FILE) {
            let file: SentenceBertFile = serde_json::from_str(&read(&path)?)
                .with_context(|| format!("Invalid {}", SENTENCE_BERT_CONFIG_FILE))?;
            config.max_seq_length = file.max_seq_length;
            config.do_lower_case = file.do_lower_case;
        }

        debug!(?config, "Sentence-transformers pipeline settings");
        Ok(config)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_modules(json: &str) -> Result<ModuleStack> {
    let modules: Vec<ModuleEntry> =
        serde_json::from_str(json).with_context(|| format!("Invalid {}", MODULES_FILE))?;

    Ok(ModuleStack {
        pooling_dir: modules
            .iter()
            .find(|m| m.kind.ends_with(POOLING_MODULE_SUFFIX))
            .map(|m| m.path.clone()),
        normalize: modules
            .iter()
            .any(|m| m.kind.ends_with(NORMALIZE_MODULE_SUFFIX)),
    })
}

fn parse_pooling(json: &str) -> Result<PoolingMode> {
    let file: PoolingFile = serde_json::from_str(json).context("Invalid pooling config")?;

    let enabled: Vec<PoolingMode> = [
        (file.pooling_mode_cls_token, PoolingMode::Cls),
        (file.pooling_mode_mean_tokens, PoolingMode::Mean),
        (file.pooling_mode_max_tokens, PoolingMode::Max),
        (file.pooling_mode_mean_sqrt_len_tokens, PoolingMode::MeanSqrtLen),
        (file.pooling_mode_lasttoken, PoolingMode::LastToken),
    ]
    .into_iter()
    .filter_map(|(on, mode)| on.then_some(mode))
    .collect();

    match enabled.as_slice() {
        [mode] => Ok(*mode),
        [] => anyhow::bail!("Pooling config enables no pooling mode"),
        modes => anyhow::bail!("Concatenated pooling modes are not supported: {:?}", modes),
    }
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for the vectorizer service
//!
//! Used by consumers (indexers, retrieval services) that need embeddings.
//! Results are returned in the same order as the input texts.

use crate::api::EmbedResponse;
use crate::vectorizer::codec::{decode_bytes, decode_embedding, DecodeError};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("texts cannot be empty")]
    EmptyBatch,

    #[error("text cannot be empty")]
    EmptyText,

    #[error("failed to reach vectorizer: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vectorizer returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("failed to decode embedding at index {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("received empty embedding at index {0} from vectorizer")]
    EmptyEmbedding(usize),
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    texts: &'a [String],
}

/// Shared client for one vectorizer base URL
#[derive(Debug, Clone)]
pub struct VectorizerClient {
    base_url: String,
    http: reqwest::Client,
}

impl VectorizerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Succeeds when `GET /health` answers 200
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(())
    }

    /// Embeds a batch and returns the raw little-endian f32 bytes per text
    pub async fn vectorize_batch(&self, texts: &[String]) -> Result<Vec<Vec<u8>>, ClientError> {
        let response = self.embed(texts).await?;

        response
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let bytes = decode_bytes(&item.embedding)
                    .map_err(|source| ClientError::Decode { index, source })?;
                if bytes.is_empty() {
                    return Err(ClientError::EmptyEmbedding(index));
                }
                Ok(bytes)
            })
            .collect()
    }

    /// Embeds a batch and decodes every payload into floats
    pub async fn vectorize_batch_f32(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, ClientError> {
        let response = self.embed(texts).await?;

        response
            .embeddings
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let vector = decode_embedding(item)
                    .map_err(|source| ClientError::Decode { index, source })?;
                if vector.is_empty() {
                    return Err(ClientError::EmptyEmbedding(index));
                }
                Ok(vector)
            })
            .collect()
    }

    /// Single-text convenience over [`Self::vectorize_batch`]
    pub async fn vectorize(&self, text: &str) -> Result<Vec<u8>, ClientError> {
        if text.is_empty() {
            return Err(ClientError::EmptyText);
        }

        let mut embeddings = self.vectorize_batch(&[text.to_string()]).await?;
        embeddings.pop().ok_or(ClientError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ClientError> {
        if texts.is_empty() {
            return Err(ClientError::EmptyBatch);
        }

        let resp = self
            .http
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedBody { texts })
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let response: EmbedResponse = resp.json().await?;
        if response.embedding_count() != texts.len() {
            return Err(ClientError::CountMismatch {
                expected: texts.len(),
                actual: response.embedding_count(),
            });
        }

        Ok(response)
    }
}

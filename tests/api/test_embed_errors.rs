// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error Handling Tests for the Embedding API
//!
//! Verifies status codes and exact `detail` messages for:
//! - Empty batches and empty/whitespace texts (400)
//! - Model failures and malformed model output (500)
//! - Malformed request bodies (rejected by the JSON extractor)

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use fabstir_vectorizer::{
    api::{create_app, AppState, ErrorResponse},
    embeddings::{EmbeddingModel, HashEmbeddingModel},
    vectorizer::VectorizerService,
};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

/// Model whose every call fails
struct FailingModel;

#[async_trait]
impl EmbeddingModel for FailingModel {
    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("CUDA out of memory"))
    }

    fn dimension(&self) -> usize {
        384
    }

    fn model_name(&self) -> &str {
        "failing-model"
    }
}

/// Model that drops the last vector of every batch
struct ShortBatchModel;

#[async_trait]
impl EmbeddingModel for ShortBatchModel {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(vec![vec![0.0; 4]; texts.len().saturating_sub(1)])
    }

    fn dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "short-batch-model"
    }
}

fn app_with(model: Arc<dyn EmbeddingModel>) -> Router {
    create_app(AppState::new(VectorizerService::new(model)))
}

fn default_app() -> Router {
    app_with(Arc::new(HashEmbeddingModel::new("test-model", 8).unwrap()))
}

async fn post_embed(app: Router, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn detail(bytes: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(bytes).unwrap().detail
}

#[tokio::test]
async fn test_empty_batch_returns_400() {
    let (status, body) = post_embed(default_app(), r#"{"texts": []}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Texts array cannot be empty");
}

#[tokio::test]
async fn test_empty_text_returns_400_with_index() {
    let (status, body) = post_embed(default_app(), r#"{"texts": ["ok", ""]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Text at index 1 cannot be empty");
}

#[tokio::test]
async fn test_first_whitespace_text_reported() {
    let (status, body) =
        post_embed(default_app(), r#"{"texts": ["a", "b", " \t\n", ""]}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Text at index 2 cannot be empty");

    let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.error_type, "invalid_input");
}

#[tokio::test]
async fn test_model_failure_returns_500() {
    let (status, body) = post_embed(app_with(Arc::new(FailingModel)), r#"{"texts": ["hello"]}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        detail(&body),
        "Failed to generate embeddings: CUDA out of memory"
    );
}

#[tokio::test]
async fn test_short_model_output_returns_500() {
    let (status, body) = post_embed(
        app_with(Arc::new(ShortBatchModel)),
        r#"{"texts": ["one", "two"]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = detail(&body);
    assert!(
        message.starts_with("Failed to generate embeddings: "),
        "{}",
        message
    );
    assert!(message.contains("expected 2 embeddings, got 1"), "{}", message);
}

#[tokio::test]
async fn test_invalid_input_checked_before_model() {
    // A failing model must not be reached for an invalid batch
    let (status, body) = post_embed(app_with(Arc::new(FailingModel)), r#"{"texts": []}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail(&body), "Texts array cannot be empty");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (status, _) = post_embed(default_app(), r#"{"texts": "not-a-list"}"#).await;
    assert!(status.is_client_error(), "got {}", status);

    let (status, _) = post_embed(default_app(), r#"{"text": ["typo"]}"#).await;
    assert!(status.is_client_error(), "got {}", status);

    let (status, _) = post_embed(default_app(), "not json").await;
    assert!(status.is_client_error(), "got {}", status);
}

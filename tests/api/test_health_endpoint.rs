// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Health and service-info endpoint tests
//!
//! GET /health and GET / must report the dimension that /embed actually
//! produces, without invoking the model.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use fabstir_vectorizer::{
    api::{create_app, AppState, EmbedResponse},
    embeddings::HashEmbeddingModel,
    vectorizer::{HealthStatus, ServiceInfo, VectorizerService},
};
use std::sync::Arc;
use tower::ServiceExt;

fn setup_app(dimension: usize) -> (Router, Arc<HashEmbeddingModel>) {
    let model = Arc::new(HashEmbeddingModel::new("all-MiniLM-L6-v2", dimension).unwrap());
    let app = create_app(AppState::new(VectorizerService::new(model.clone())));
    (app, model)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_health_reports_model_and_dimension() {
    let (app, model) = setup_app(384);

    let (status, body) = send(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.model, "all-MiniLM-L6-v2");
    assert_eq!(health.dimension, 384);
    assert_eq!(model.batch_calls(), 0, "health must not invoke the model");
}

#[tokio::test]
async fn test_health_dimension_matches_embed() {
    let (app, _) = setup_app(96);

    let (_, health_body) = send(app.clone(), Method::GET, "/health", None).await;
    let health: HealthStatus = serde_json::from_slice(&health_body).unwrap();

    let (status, embed_body) = send(
        app,
        Method::POST,
        "/embed",
        Some(r#"{"texts": ["hello", "world"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: EmbedResponse = serde_json::from_slice(&embed_body).unwrap();
    assert_eq!(response.dimension(), Some(health.dimension));
}

#[tokio::test]
async fn test_root_describes_service() {
    let (app, _) = setup_app(384);

    let (status, body) = send(app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    let info: ServiceInfo = serde_json::from_slice(&body).unwrap();
    assert_eq!(info.model, "all-MiniLM-L6-v2");
    assert_eq!(info.dimension, 384);
    assert_eq!(info.endpoints.embed, "POST /embed - Generate embeddings");
    assert_eq!(info.endpoints.health, "GET /health - Health check");
}

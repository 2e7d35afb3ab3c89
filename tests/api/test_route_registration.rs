// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route Registration tests
//!
//! These tests verify that:
//! - POST /embed, GET /health and GET / are registered
//! - Wrong methods are rejected with 405
//! - Unknown paths return 404
//! - Request bodies above axum's 2 MiB default are accepted
//! - A real TCP server serves the same router

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use fabstir_vectorizer::{
    api::{create_app, AppState, EmbedResponse},
    embeddings::HashEmbeddingModel,
    vectorizer::VectorizerService,
};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

fn setup_app() -> Router {
    let model = Arc::new(HashEmbeddingModel::new("test-model", 16).unwrap());
    create_app(AppState::new(VectorizerService::new(model)))
}

async fn status_of(method: Method, uri: &str, body: Body) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    setup_app().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_embed_route_registered() {
    let status = status_of(
        Method::POST,
        "/embed",
        Body::from(r#"{"texts": ["test"]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_embed_route_rejects_get() {
    let status = status_of(Method::GET, "/embed", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_route_rejects_post() {
    let status = status_of(Method::POST, "/health", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let status = status_of(Method::GET, "/v1/embed", Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_embed_accepts_body_over_default_limit() {
    let texts: Vec<String> = (0..3000)
        .map(|i| format!("{} {}", i, "lorem ipsum dolor sit amet ".repeat(37)))
        .collect();
    let body = serde_json::to_vec(&serde_json::json!({ "texts": &texts })).unwrap();
    assert!(body.len() > 2 * 1024 * 1024);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = setup_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: EmbedResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.embedding_count(), texts.len());
    assert_eq!(body.dimension(), Some(16));
}

#[tokio::test]
async fn test_served_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, setup_app()).await.unwrap();
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/embed", addr))
        .json(&serde_json::json!({"texts": ["over", "tcp"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: EmbedResponse = response.json().await.unwrap();
    assert_eq!(body.embeddings.len(), 2);
    assert_eq!(body.dimension(), Some(16));

    server.abort();
}

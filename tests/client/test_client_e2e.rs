// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end tests: VectorizerClient against a live server on an ephemeral port

use fabstir_vectorizer::{
    api::{create_app, AppState},
    client::{ClientError, VectorizerClient},
    embeddings::HashEmbeddingModel,
    vectorizer::codec::vector_to_bytes,
    vectorizer::VectorizerService,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

struct TestServer {
    base_url: String,
    model: Arc<HashEmbeddingModel>,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn spawn_server(dimension: usize) -> TestServer {
    let model = Arc::new(HashEmbeddingModel::new("test-model", dimension).unwrap());
    let app = create_app(AppState::new(VectorizerService::new(model.clone())));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        model,
        handle,
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = spawn_server(32).await;
    let client = VectorizerClient::new(&server.base_url).unwrap();

    client.health_check().await.unwrap();
}

#[tokio::test]
async fn test_vectorize_batch_returns_raw_bytes_in_order() {
    let server = spawn_server(32).await;
    let client = VectorizerClient::new(&server.base_url).unwrap();

    let input = texts(&["alpha", "beta", "alpha"]);
    let bytes = client.vectorize_batch(&input).await.unwrap();

    assert_eq!(bytes.len(), 3);
    for (text, payload) in input.iter().zip(&bytes) {
        assert_eq!(payload.len(), 4 * 32);
        assert_eq!(payload, &vector_to_bytes(&server.model.embed_one(text)));
    }
}

#[tokio::test]
async fn test_vectorize_batch_f32() {
    let server = spawn_server(8).await;
    let client = VectorizerClient::new(&server.base_url).unwrap();

    let vectors = client
        .vectorize_batch_f32(&texts(&["hello", "world"]))
        .await
        .unwrap();

    assert_eq!(vectors[0], server.model.embed_one("hello"));
    assert_eq!(vectors[1], server.model.embed_one("world"));
}

#[tokio::test]
async fn test_vectorize_single() {
    let server = spawn_server(8).await;
    let client = VectorizerClient::new(&server.base_url).unwrap();

    let bytes = client.vectorize("hello").await.unwrap();
    assert_eq!(bytes, vector_to_bytes(&server.model.embed_one("hello")));
}

#[tokio::test]
async fn test_server_rejection_surfaces_status_and_body() {
    let server = spawn_server(8).await;
    let client = VectorizerClient::new(&server.base_url).unwrap();

    let err = client
        .vectorize_batch(&texts(&["ok", "   "]))
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("Text at index 1 cannot be empty"), "{}", body);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = VectorizerClient::new(format!("http://{}", addr)).unwrap();
    assert!(matches!(
        client.health_check().await,
        Err(ClientError::Transport(_))
    ));
}

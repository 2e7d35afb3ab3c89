// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::embed::embed_handler;
use crate::vectorizer::{HealthStatus, ServiceInfo, VectorizerService};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VectorizerService>,
}

impl AppState {
    pub fn new(service: VectorizerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Service metadata
        .route("/", get(root_handler))
        // Health check
        .route("/health", get(health_handler))
        // Embedding endpoint
        .route("/embed", post(embed_handler))
        // Batch size is unbounded; the 2 MiB extractor default would reject valid batches
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds `addr` and serves until ctrl-c
pub async fn start_server(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Vectorizer listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Vectorizer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health().health())
}

async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(state.service.health().service_info())
}

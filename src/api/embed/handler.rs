// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::ApiError;
use axum::{extract::State, Json};
use tracing::info;

/// POST /embed handler
///
/// Validates the batch, runs it through the model in one call and returns
/// base64 little-endian f32 payloads in request order.
///
/// # Errors
/// - 400 when the batch is empty or a text is empty/whitespace-only
/// - 500 when the model fails or returns an unusable batch
pub async fn embed_handler(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let response: EmbedResponse = state.service.embed(&request.texts).await?.into();

    info!(
        "Generated {} embeddings ({} dimensions)",
        response.embedding_count(),
        state.service.health().dimension()
    );

    Ok(Json(response))
}

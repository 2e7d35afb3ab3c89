// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model identity snapshot for health checks and service self-description

use crate::version;
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "Fabstir Vectorizer";

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model: String,
    pub dimension: usize,
}

/// Endpoint summary included in `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub embed: String,
    pub health: String,
}

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub model: String,
    pub dimension: usize,
    pub version: String,
    pub endpoints: EndpointSummary,
}

/// Reports the model name and dimension captured at startup
///
/// Never touches the model itself, so health probes stay cheap and cannot
/// fail once the service is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReporter {
    model_name: String,
    dimension: usize,
}

impl HealthReporter {
    pub fn new(model_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            model: self.model_name.clone(),
            dimension: self.dimension,
        }
    }

    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            service: SERVICE_NAME.to_string(),
            model: self.model_name.clone(),
            dimension: self.dimension,
            version: version::VERSION_NUMBER.to_string(),
            endpoints: EndpointSummary {
                embed: "POST /embed - Generate embeddings".to_string(),
                health: "GET /health - Health check".to_string(),
            },
        }
    }
}

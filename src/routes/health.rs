// ABOUTME: Health check and service banner routes
// ABOUTME: Liveness probe for deployment and a root endpoint for smoke checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::server::ServerResources;

/// Health probe payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Service banner payload
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
}

/// Health check route handlers
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create health and banner routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/api/v1", get(Self::handle_index))
            .with_state(resources)
    }

    /// Liveness probe
    async fn handle_health() -> Response {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".into(),
                service: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
            }),
        )
            .into_response()
    }

    /// Service banner
    async fn handle_index() -> Response {
        (
            StatusCode::OK,
            Json(IndexResponse {
                message: "Tally Finance API is running.".into(),
            }),
        )
            .into_response()
    }
}

// ABOUTME: Server resource wiring and the top-level axum router
// ABOUTME: Explicit construction of services from their dependencies; no global registries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! Server composition
//!
//! [`ServerResources`] holds every shared collaborator, constructed once at
//! startup and handed to routes as state. Services receive their store,
//! codec and configuration dependencies here; nothing reaches for process
//! globals.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthMiddleware;
use crate::routes::{AdminRoutes, AdminService, AuthRoutes, AuthService, HealthRoutes, UserRoutes};

/// Shared server state handed to every route
pub struct ServerResources {
    /// Database handle (pool-backed, cheap to share)
    pub database: Arc<Database>,
    /// Access token codec
    pub auth_manager: Arc<AuthManager>,
    /// Request authentication middleware
    pub auth_middleware: AuthMiddleware,
    /// Session issuance/rotation service
    pub auth_service: AuthService,
    /// Privileged admin operations
    pub admin_service: AdminService,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Wire up all services from their dependencies
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        let database = Arc::new(database);
        let config = Arc::new(config);
        let auth_manager = Arc::new(AuthManager::new(
            &config.auth.jwt_secret,
            config.auth.access_token_expiry_minutes,
        ));

        let auth_middleware = AuthMiddleware::new(Arc::clone(&auth_manager), Arc::clone(&database));
        let auth_service = AuthService::new(
            Arc::clone(&database),
            Arc::clone(&auth_manager),
            config.auth.refresh_token_expiry_days,
        );
        let admin_service = AdminService::new(Arc::clone(&database));

        Self {
            database,
            auth_manager,
            auth_middleware,
            auth_service,
            admin_service,
            config,
        }
    }
}

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(UserRoutes::routes(Arc::clone(&resources)))
        .merge(AdminRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until shutdown
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server loop fails
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let port = resources.config.http_port;
    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind port {port}: {e}")))?;

    tracing::info!("listening on port {port}");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}

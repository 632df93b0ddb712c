// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handoff_core::{AdapterType, HandoffError, PluginAdapter};
use handoff_pipeline::DeliveryOrchestrator;
use handoff_security::Redactor;

use crate::auth::RetryAuth;
use crate::handlers;

/// Path the chat widget posts triggers to.
pub const HANDOFF_PATH: &str = "/api/chat/handoff";

/// Inputs for the health endpoint.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
    pub service_name: String,
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    pub not_configured: Vec<AdapterType>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub orchestrator: Arc<DeliveryOrchestrator>,
    pub auth: RetryAuth,
    /// Scrubs credentials from error text before it leaves the process.
    pub redactor: Redactor,
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

/// Build the router: trigger and health routes, body limit, CORS, tracing.
pub fn router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(HANDOFF_PATH, post(handlers::post_handoff))
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), HandoffError> {
    let app = router(state, config.max_body_bytes);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HandoffError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| HandoffError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

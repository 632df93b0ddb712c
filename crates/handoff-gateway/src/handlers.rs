// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles POST /api/chat/handoff and GET /health.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use handoff_core::types::TriggerRequest;
use handoff_core::{ErrorKind, HandoffError, HealthStatus};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    /// Machine-readable error kind.
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
    /// Adapter roles with nothing wired in.
    pub not_configured: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    #[serde(rename = "type")]
    pub adapter_type: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// HTTP status for a pipeline error.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::StorageNotConfigured
        | ErrorKind::TransportNotConfigured
        | ErrorKind::Config => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Conversation
        | ErrorKind::Summarizer
        | ErrorKind::Transport
        | ErrorKind::Fetch => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /api/chat/handoff
///
/// Business outcomes are 200 with `ok: true`; only bad input and
/// infrastructure failures map to error statuses.
pub async fn post_handoff(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<TriggerRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "rejected trigger payload");
            return (
                rejection.status(),
                Json(ErrorResponse::new(
                    ErrorKind::InvalidInput.as_str(),
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    if request.reason.is_system_retry() && !state.auth.permits(&headers) {
        warn!(thread_id = %request.thread_id, "unauthorized server_retry trigger");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "unauthorized",
                "server_retry triggers require the retry token",
            )),
        )
            .into_response();
    }

    match state.orchestrator.handle(request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(&state, &e),
    }
}

fn error_response(state: &GatewayState, e: &HandoffError) -> Response {
    let kind = e.kind();
    let status = status_for(kind);
    if status.is_server_error() {
        error!(kind = %kind, error = %e, "handoff trigger failed");
    }
    (
        status,
        Json(ErrorResponse::new(
            kind.as_str(),
            state.redactor.redact(&e.to_string()),
        )),
    )
        .into_response()
}

/// GET /health
///
/// 200 when every configured adapter is healthy or degraded, 503 otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let checks = join_all(state.health.adapters.iter().map(|a| a.health_check())).await;

    let mut unhealthy = false;
    let adapters: Vec<AdapterHealth> = state
        .health
        .adapters
        .iter()
        .zip(checks)
        .map(|(adapter, check)| {
            let (status, detail) = match check {
                Ok(HealthStatus::Healthy) => ("healthy", None),
                Ok(HealthStatus::Degraded(d)) => ("degraded", Some(d)),
                Ok(HealthStatus::Unhealthy(d)) => ("unhealthy", Some(d)),
                Err(e) => ("unhealthy", Some(e.to_string())),
            };
            unhealthy |= status == "unhealthy";
            AdapterHealth {
                name: adapter.name().to_string(),
                adapter_type: adapter.adapter_type().to_string(),
                status,
                detail: detail.map(|d| state.redactor.redact(&d)),
            }
        })
        .collect();

    let body = HealthResponse {
        status: if unhealthy { "unhealthy" } else { "ok" },
        service: state.health.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
        not_configured: state
            .health
            .not_configured
            .iter()
            .map(|t| t.to_string())
            .collect(),
    };
    let status = if unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::StorageNotConfigured),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(ErrorKind::TransportNotConfigured),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_for(ErrorKind::Summarizer), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Transport), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(ErrorKind::Storage),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_is_not_ok() {
        let json = serde_json::to_value(ErrorResponse::new("invalid_input", "bad")).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "invalid_input");
    }
}

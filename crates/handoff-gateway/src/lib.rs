// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of the handoff service.
//!
//! `POST /api/chat/handoff` accepts widget triggers and returns the
//! pipeline outcome; `GET /health` reports adapter health.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::RetryAuth;
pub use handlers::status_for;
pub use server::{GatewayState, HANDOFF_PATH, HealthState, ServerConfig, router, start_server};

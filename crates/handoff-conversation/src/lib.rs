// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation API access for the handoff pipeline.
//!
//! [`ChatKitClient`] lists thread items over HTTP; [`TranscriptRetriever`]
//! pages through them and produces normalized transcript lines.

pub mod client;
pub mod retriever;
pub mod types;

pub use client::ChatKitClient;
pub use retriever::{TranscriptRetriever, attachment_marker, normalize_text};

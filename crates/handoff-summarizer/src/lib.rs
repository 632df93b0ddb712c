// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Readiness summarizer for the handoff pipeline.
//!
//! Sends the transcript to a chat-completions model under a strict JSON
//! schema and filters the answer field by field before anyone trusts it.

pub mod client;
pub mod prompt;
pub mod sanitize;

pub use client::OpenAiSummarizer;
pub use sanitize::{plausible_email, plausible_phone};

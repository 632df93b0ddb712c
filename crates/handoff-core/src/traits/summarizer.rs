// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarizer adapter trait (text-generation service).

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{SummaryOutcome, TranscriptLine};

/// Opaque summarizer that judges handoff readiness.
///
/// Returns `Err` only when the service could not be reached or refused the
/// request. A response that does not honor the output contract is reported
/// as [`SummaryOutcome::Malformed`] so callers can fail closed.
#[async_trait]
pub trait Summarizer: PluginAdapter {
    async fn summarize(&self, transcript: &[TranscriptLine])
    -> Result<SummaryOutcome, HandoffError>;
}

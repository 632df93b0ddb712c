// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock summarizer with a scripted verdict.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use handoff_core::types::{
    AdapterType, HandoffReason, HealthStatus, LeadSummary, SummaryOutcome, TranscriptLine,
};
use handoff_core::{HandoffError, PluginAdapter, Summarizer};

/// What the mock answers.
#[derive(Debug, Clone)]
pub enum Verdict {
    Outcome(SummaryOutcome),
    /// Simulate an unreachable service.
    Unavailable(String),
}

/// Returns the configured verdict for every call and counts calls.
pub struct MockSummarizer {
    verdict: Mutex<Verdict>,
    calls: AtomicUsize,
}

impl MockSummarizer {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict: Mutex::new(verdict),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always ready, with a plausible filled-in summary.
    pub fn ready() -> Self {
        Self::new(Verdict::Outcome(SummaryOutcome::Summary(ready_summary())))
    }

    pub async fn set_verdict(&self, verdict: Verdict) {
        *self.verdict.lock().await = verdict;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A summary that clears the readiness gate.
pub fn ready_summary() -> LeadSummary {
    LeadSummary {
        name: Some("Jane Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        service: Some("Kitchen remodel".to_string()),
        timeline: Some("Next month".to_string()),
        summary: Some("Wants a quote for a kitchen remodel.".to_string()),
        handoff_ready: true,
        next_steps: vec!["Call to schedule a site visit".to_string()],
        ..LeadSummary::not_ready(HandoffReason::ContactAndNeedCaptured)
    }
}

#[async_trait]
impl PluginAdapter for MockSummarizer {
    fn name(&self) -> &str {
        "mock-summarizer"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Summarizer
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        _transcript: &[TranscriptLine],
    ) -> Result<SummaryOutcome, HandoffError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.verdict.lock().await.clone() {
            Verdict::Outcome(outcome) => Ok(outcome),
            Verdict::Unavailable(message) => Err(HandoffError::Summarizer {
                message,
                source: None,
            }),
        }
    }
}

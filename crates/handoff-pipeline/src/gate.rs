// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Readiness gate: turns a summarizer result into send / don't-send.

use handoff_core::types::{HandoffReason, LeadSummary, SummaryOutcome};

use crate::outcome::HandoffOutcome;

/// Detail reported when no summarizer is configured.
pub const SUMMARIZER_UNAVAILABLE: &str = "summarizer_unavailable";
/// Detail reported when the summarizer answered outside its contract.
pub const MALFORMED_SUMMARY: &str = "malformed_summary";

/// Gate decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready(LeadSummary),
    NotReady(HandoffOutcome),
}

/// Fail closed: only an explicit `handoff_ready = true` passes.
pub fn evaluate(outcome: SummaryOutcome) -> Readiness {
    match outcome {
        SummaryOutcome::Summary(summary) if summary.handoff_ready => Readiness::Ready(summary),
        SummaryOutcome::Summary(summary) => Readiness::NotReady(HandoffOutcome::not_ready(
            summary.handoff_reason,
            summary.missing_info,
            None,
        )),
        SummaryOutcome::Malformed(_) => Readiness::NotReady(HandoffOutcome::not_ready(
            HandoffReason::Unknown,
            Vec::new(),
            Some(MALFORMED_SUMMARY.to_string()),
        )),
    }
}

/// Outcome when there is no summarizer to ask.
pub fn unavailable() -> HandoffOutcome {
    HandoffOutcome::not_ready(
        HandoffReason::Unknown,
        Vec::new(),
        Some(SUMMARIZER_UNAVAILABLE.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::OutcomeReason;

    #[test]
    fn ready_summary_passes() {
        let summary = LeadSummary {
            handoff_ready: true,
            ..LeadSummary::not_ready(HandoffReason::ContactAndNeedCaptured)
        };
        assert_eq!(
            evaluate(SummaryOutcome::Summary(summary.clone())),
            Readiness::Ready(summary)
        );
    }

    #[test]
    fn not_ready_carries_reason_and_missing_info() {
        let summary = LeadSummary {
            missing_info: vec!["address".into()],
            ..LeadSummary::not_ready(HandoffReason::MissingProjectDetails)
        };
        let Readiness::NotReady(outcome) = evaluate(SummaryOutcome::Summary(summary)) else {
            panic!("expected not ready");
        };
        assert_eq!(outcome.reason, OutcomeReason::NotReady);
        assert_eq!(outcome.handoff_reason, Some(HandoffReason::MissingProjectDetails));
        assert_eq!(outcome.missing_info, vec!["address"]);
    }

    #[test]
    fn malformed_fails_closed() {
        let Readiness::NotReady(outcome) = evaluate(SummaryOutcome::Malformed("bad".into())) else {
            panic!("expected not ready");
        };
        assert_eq!(outcome.detail.as_deref(), Some(MALFORMED_SUMMARY));
        assert!(!outcome.sent);
    }
}

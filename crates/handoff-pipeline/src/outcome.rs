// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business outcomes of a pipeline invocation.
//!
//! Every variant here is a successful response to the caller; failures are
//! [`handoff_core::HandoffError`]s.

use serde::Serialize;
use strum::Display;

use handoff_core::types::HandoffReason;

/// Machine-readable outcome reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeReason {
    Sent,
    AlreadySent,
    InProgress,
    Cooldown,
    EmptyTranscript,
    MissingContact,
    NotIdle,
    NotReady,
}

/// Response body for a trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffOutcome {
    pub ok: bool,
    pub sent: bool,
    pub reason: OutcomeReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// When a live lease or cooldown ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_reason: Option<HandoffReason>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_info: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlined: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HandoffOutcome {
    fn base(sent: bool, reason: OutcomeReason) -> Self {
        Self {
            ok: true,
            sent,
            reason,
            sent_at: None,
            message_id: None,
            lock_expires_at: None,
            retry_at: None,
            scheduled: None,
            handoff_reason: None,
            missing_info: Vec::new(),
            attachments: None,
            inlined: None,
            detail: None,
        }
    }

    pub fn sent(sent_at: i64, message_id: Option<String>, attachments: usize, inlined: usize) -> Self {
        Self {
            sent_at: Some(sent_at),
            message_id,
            attachments: Some(attachments),
            inlined: Some(inlined),
            ..Self::base(true, OutcomeReason::Sent)
        }
    }

    pub fn already_sent(sent_at: Option<i64>, message_id: Option<String>) -> Self {
        Self {
            sent_at,
            message_id,
            ..Self::base(true, OutcomeReason::AlreadySent)
        }
    }

    pub fn in_progress(lock_expires_at: Option<i64>) -> Self {
        Self {
            lock_expires_at,
            ..Self::base(false, OutcomeReason::InProgress)
        }
    }

    pub fn cooldown(lock_expires_at: i64) -> Self {
        Self {
            lock_expires_at: Some(lock_expires_at),
            ..Self::base(false, OutcomeReason::Cooldown)
        }
    }

    pub fn empty_transcript() -> Self {
        Self::base(false, OutcomeReason::EmptyTranscript)
    }

    pub fn missing_contact() -> Self {
        Self::base(false, OutcomeReason::MissingContact)
    }

    pub fn not_idle(retry_at: i64, scheduled: bool) -> Self {
        Self {
            retry_at: Some(retry_at),
            scheduled: Some(scheduled),
            ..Self::base(false, OutcomeReason::NotIdle)
        }
    }

    pub fn not_ready(
        handoff_reason: HandoffReason,
        missing_info: Vec<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            handoff_reason: Some(handoff_reason),
            missing_info,
            detail,
            ..Self::base(false, OutcomeReason::NotReady)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_empty() {
        let json = serde_json::to_value(HandoffOutcome::not_idle(1_000, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ok": true,
                "sent": false,
                "reason": "not_idle",
                "retryAt": 1000,
                "scheduled": true
            })
        );
    }

    #[test]
    fn already_sent_reports_sent_true() {
        let outcome = HandoffOutcome::already_sent(Some(5), Some("<m@x>".into()));
        assert!(outcome.sent);
        assert_eq!(outcome.reason.to_string(), "already_sent");
    }
}

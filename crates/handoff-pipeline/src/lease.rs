// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation idempotency record and send lease.
//!
//! All coordination between concurrent invocations goes through
//! [`RecordStore::try_transition`]; nothing here reads and then writes.
//! Finalizing writes are guarded by the lease id, so a holder whose lease
//! expired and was taken over cannot overwrite the new holder's outcome.

use std::sync::Arc;

use tracing::{debug, info, warn};

use handoff_core::error::truncate_message;
use handoff_core::types::{
    DedupeRecord, DeliveryStatus, RecordUpdate, TransitionGuard, TriggerReason,
};
use handoff_core::{Clock, HandoffError, RecordStore};
use handoff_security::Redactor;

/// Stored error messages are cut to this many characters.
const MAX_ERROR_CHARS: usize = 500;

/// Result of a lease attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire {
    Acquired { lease_id: String },
    /// Another invocation holds the lease, is cooling down, or already sent.
    /// Carries the record as re-read after the failed write.
    Busy(Option<DedupeRecord>),
}

/// What an existing record says about a new invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordState {
    Sent {
        sent_at: Option<i64>,
        message_id: Option<String>,
    },
    InProgress { lock_expires_at: i64 },
    Cooldown { lock_expires_at: i64 },
    /// No record, or its lock has lapsed.
    Open,
}

impl RecordState {
    pub fn of(record: Option<&DedupeRecord>, now: i64) -> Self {
        let Some(record) = record else {
            return RecordState::Open;
        };
        match (record.status, record.lock_expires_at) {
            (DeliveryStatus::Sent, _) => RecordState::Sent {
                sent_at: record.sent_at,
                message_id: record.message_id.clone(),
            },
            (DeliveryStatus::Sending, Some(at)) if at > now => {
                RecordState::InProgress { lock_expires_at: at }
            }
            (DeliveryStatus::Error, Some(at)) if at > now => {
                RecordState::Cooldown { lock_expires_at: at }
            }
            _ => RecordState::Open,
        }
    }
}

/// Timing for leases and cooldowns, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseTimings {
    pub lease_secs: i64,
    pub cooldown_secs: i64,
    pub retention_secs: i64,
}

pub struct LeaseManager {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    timings: LeaseTimings,
    redactor: Redactor,
}

impl LeaseManager {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        timings: LeaseTimings,
        redactor: Redactor,
    ) -> Self {
        Self {
            store,
            clock,
            timings,
            redactor,
        }
    }

    /// Unconditional read for the fast path.
    pub async fn read(&self, thread_id: &str) -> Result<Option<DedupeRecord>, HandoffError> {
        self.store.get(thread_id).await
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Claim the send lease if the record is absent, or not `sent` and not locked.
    pub async fn acquire(
        &self,
        thread_id: &str,
        reason: TriggerReason,
    ) -> Result<Acquire, HandoffError> {
        let now = self.clock.now();
        let lease_id = uuid::Uuid::new_v4().to_string();
        let guard = TransitionGuard::Claimable {
            from: vec![DeliveryStatus::Sending, DeliveryStatus::Error],
            now,
        };
        let update = RecordUpdate {
            status: DeliveryStatus::Sending,
            lease_id: Some(lease_id.clone()),
            lock_expires_at: Some(now + self.timings.lease_secs),
            sent_at: None,
            message_id: None,
            last_error: None,
            last_reason: Some(reason.to_string()),
            now,
            ttl: now + self.timings.retention_secs,
            bump_attempts: true,
        };

        if self.store.try_transition(thread_id, &guard, &update).await? {
            info!(thread_id, lease_id = %lease_id, %reason, "send lease acquired");
            return Ok(Acquire::Acquired { lease_id });
        }

        let existing = self.store.get(thread_id).await?;
        debug!(
            thread_id,
            status = ?existing.as_ref().map(|r| r.status),
            "send lease not acquired"
        );
        Ok(Acquire::Busy(existing))
    }

    /// Terminal success. Returns `false` when the lease was lost before finalizing.
    pub async fn mark_sent(
        &self,
        thread_id: &str,
        lease_id: &str,
        message_id: Option<&str>,
    ) -> Result<bool, HandoffError> {
        let now = self.clock.now();
        let update = RecordUpdate {
            status: DeliveryStatus::Sent,
            lease_id: None,
            lock_expires_at: None,
            sent_at: Some(now),
            message_id: message_id.map(String::from),
            last_error: None,
            last_reason: None,
            now,
            ttl: now + self.timings.retention_secs,
            bump_attempts: false,
        };
        let ok = self
            .store
            .try_transition(thread_id, &held_by(lease_id), &update)
            .await?;
        if ok {
            info!(thread_id, lease_id, "delivery recorded as sent");
        } else {
            warn!(thread_id, lease_id, "lease lost before marking sent");
        }
        Ok(ok)
    }

    /// Failure with a cooldown. The stored message is redacted and truncated.
    pub async fn mark_error(
        &self,
        thread_id: &str,
        lease_id: &str,
        error: &HandoffError,
    ) -> Result<bool, HandoffError> {
        let now = self.clock.now();
        let message = truncate_message(&self.redactor.redact(&error.to_string()), MAX_ERROR_CHARS);
        let update = RecordUpdate {
            status: DeliveryStatus::Error,
            lease_id: None,
            lock_expires_at: Some(now + self.timings.cooldown_secs),
            sent_at: None,
            message_id: None,
            last_error: Some(message),
            last_reason: Some(error.kind().as_str().to_string()),
            now,
            ttl: now + self.timings.retention_secs,
            bump_attempts: false,
        };
        let ok = self
            .store
            .try_transition(thread_id, &held_by(lease_id), &update)
            .await?;
        if ok {
            warn!(
                thread_id,
                lease_id,
                kind = %error.kind(),
                cooldown_secs = self.timings.cooldown_secs,
                "delivery recorded as failed"
            );
        } else {
            warn!(thread_id, lease_id, "lease lost before marking error");
        }
        Ok(ok)
    }
}

fn held_by(lease_id: &str) -> TransitionGuard {
    TransitionGuard::HeldBy {
        lease_id: lease_id.to_string(),
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warm-conversation detection and deferred retries.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use handoff_core::types::{RetrySchedule, ScheduleUpsert, TranscriptLine, TriggerRequest};
use handoff_core::{HandoffError, ScheduleStore, ThreadId};

const SCHEDULE_PREFIX: &str = "handoff-retry-";
const MAX_SCHEDULE_NAME: usize = 64;
/// Hex digits of the id digest kept when a name has to be shortened.
const DIGEST_SUFFIX_LEN: usize = 16;

/// Whether the customer may still be typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmth {
    Idle,
    Warm { last_activity: i64, retry_at: i64 },
}

/// Deterministic schedule name for a thread: `handoff-retry-` plus the id
/// with anything outside `[A-Za-z0-9_-]` replaced, capped at 64 characters.
///
/// Names over the cap keep their head and end in a digest of the full id,
/// so ids sharing a long prefix still map to distinct schedules.
pub fn schedule_name(thread_id: &str) -> String {
    let sanitized: String = thread_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = format!("{SCHEDULE_PREFIX}{sanitized}");
    if name.len() <= MAX_SCHEDULE_NAME {
        return name;
    }
    let digest = hex::encode(Sha256::digest(thread_id.as_bytes()));
    let head = &name[..MAX_SCHEDULE_NAME - DIGEST_SUFFIX_LEN - 1];
    format!("{head}-{}", &digest[..DIGEST_SUFFIX_LEN])
}

pub struct RetryScheduler {
    store: Option<Arc<dyn ScheduleStore>>,
    idle_threshold_secs: i64,
    margin_secs: i64,
}

impl RetryScheduler {
    pub fn new(
        store: Option<Arc<dyn ScheduleStore>>,
        idle_threshold_secs: i64,
        margin_secs: i64,
    ) -> Self {
        Self {
            store,
            idle_threshold_secs,
            margin_secs,
        }
    }

    /// Compare the latest line's timestamp with `now`.
    pub fn warmth(&self, lines: &[TranscriptLine], now: i64) -> Warmth {
        let Some(last_activity) = lines.iter().map(|l| l.timestamp).max() else {
            return Warmth::Idle;
        };
        if now - last_activity >= self.idle_threshold_secs {
            return Warmth::Idle;
        }
        Warmth::Warm {
            last_activity,
            retry_at: last_activity + self.idle_threshold_secs + self.margin_secs,
        }
    }

    /// Create or re-time the thread's retry. `None` when no schedule store
    /// is configured.
    ///
    /// The stored payload carries the parsed id, so the retry and
    /// [`cancel`](Self::cancel) agree on the schedule name.
    pub async fn defer(
        &self,
        thread_id: &ThreadId,
        request: &TriggerRequest,
        retry_at: i64,
    ) -> Result<Option<ScheduleUpsert>, HandoffError> {
        let Some(store) = &self.store else {
            debug!(thread_id = %thread_id, "no schedule store; retry not scheduled");
            return Ok(None);
        };
        let schedule = RetrySchedule {
            name: schedule_name(thread_id.as_str()),
            thread_id: thread_id.as_str().to_string(),
            fire_at: retry_at,
            payload: TriggerRequest {
                thread_id: thread_id.as_str().to_string(),
                ..request.as_system_retry()
            },
            enabled: true,
        };
        let result = store.upsert(&schedule).await?;
        info!(
            thread_id = %thread_id,
            schedule = %schedule.name,
            retry_at,
            result = %result,
            "retry scheduled"
        );
        Ok(Some(result))
    }

    /// Remove the thread's retry. A schedule that never existed is not an error.
    pub async fn cancel(&self, thread_id: &str) -> Result<bool, HandoffError> {
        match &self.store {
            Some(store) => store.delete(&schedule_name(thread_id)).await,
            None => Ok(false),
        }
    }
}

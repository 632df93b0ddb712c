// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delayed-invocation scheduler trait.

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{RetrySchedule, ScheduleUpsert};

/// Named, one-shot future invocations of the pipeline.
///
/// Names are unique: creating a schedule whose name exists updates it in place.
#[async_trait]
pub trait ScheduleStore: PluginAdapter {
    /// Creates the schedule, or re-enables and re-times an existing one.
    async fn upsert(&self, schedule: &RetrySchedule) -> Result<ScheduleUpsert, HandoffError>;

    /// Deletes by name. Returns `false` if no such schedule existed.
    async fn delete(&self, name: &str) -> Result<bool, HandoffError>;

    async fn get(&self, name: &str) -> Result<Option<RetrySchedule>, HandoffError>;

    /// Atomically disables and returns up to `limit` enabled schedules due at `now`.
    async fn claim_due(&self, now: i64, limit: usize) -> Result<Vec<RetrySchedule>, HandoffError>;
}

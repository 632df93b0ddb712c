// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable record store traits: dedupe/lease records and attribution.

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AttributionEntry, DedupeRecord, RecordUpdate, TransitionGuard};

/// Durable key-value store for per-conversation delivery records.
///
/// [`RecordStore::try_transition`] is the pipeline's only mutual-exclusion
/// primitive: implementations must evaluate the guard and apply the update
/// as one atomic compare-and-set, never as a read followed by a write.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Unconditional read.
    async fn get(&self, thread_id: &str) -> Result<Option<DedupeRecord>, HandoffError>;

    /// Applies `update` iff `guard` holds. Returns `false` when the guard failed.
    ///
    /// A [`TransitionGuard::Claimable`] guard creates the record when absent.
    async fn try_transition(
        &self,
        thread_id: &str,
        guard: &TransitionGuard,
        update: &RecordUpdate,
    ) -> Result<bool, HandoffError>;

    /// Deletes records whose `ttl` is at or before `now`. Returns the count removed.
    async fn purge_expired(&self, now: i64) -> Result<u64, HandoffError>;
}

/// Append-once attribution log.
#[async_trait]
pub trait AttributionLog: Send + Sync + 'static {
    /// Records first-touch attribution. Returns `false` when one already exists.
    async fn record_attribution(&self, entry: &AttributionEntry) -> Result<bool, HandoffError>;

    /// The earliest recorded attribution for a thread.
    async fn first_touch(&self, thread_id: &str) -> Result<Option<AttributionEntry>, HandoffError>;
}

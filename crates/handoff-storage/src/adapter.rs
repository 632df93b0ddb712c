// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the record, attribution and schedule traits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use handoff_config::model::StorageConfig;
use handoff_core::types::{
    AttributionEntry, DedupeRecord, RecordUpdate, RetrySchedule, ScheduleUpsert, TransitionGuard,
};
use handoff_core::{
    AdapterType, AttributionLog, Clock, HandoffError, HealthStatus, PluginAdapter, RecordStore,
    ScheduleStore, SystemClock,
};

use crate::database::Database;
use crate::queries;

fn health_of(result: Result<(), HandoffError>) -> HealthStatus {
    match result {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    }
}

/// Delivery records and first-touch attribution in SQLite.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the configured database and wrap it.
    pub async fn open(config: &StorageConfig) -> Result<Self, HandoffError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite-records"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::RecordStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(health_of(self.db.ping().await))
    }

    async fn shutdown(&self) -> Result<(), HandoffError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, thread_id: &str) -> Result<Option<DedupeRecord>, HandoffError> {
        queries::records::get(&self.db, thread_id).await
    }

    async fn try_transition(
        &self,
        thread_id: &str,
        guard: &TransitionGuard,
        update: &RecordUpdate,
    ) -> Result<bool, HandoffError> {
        let applied = queries::records::try_transition(&self.db, thread_id, guard, update).await?;
        debug!(thread_id, applied, status = %update.status, "record transition");
        Ok(applied)
    }

    async fn purge_expired(&self, now: i64) -> Result<u64, HandoffError> {
        queries::records::purge_expired(&self.db, now).await
    }
}

#[async_trait]
impl AttributionLog for SqliteRecordStore {
    async fn record_attribution(&self, entry: &AttributionEntry) -> Result<bool, HandoffError> {
        queries::attribution::record_first(&self.db, entry).await
    }

    async fn first_touch(&self, thread_id: &str) -> Result<Option<AttributionEntry>, HandoffError> {
        queries::attribution::first_touch(&self.db, thread_id).await
    }
}

/// Retry schedules in SQLite. Shares the record store's database.
#[derive(Clone)]
pub struct SqliteScheduleStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteScheduleStore {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

#[async_trait]
impl PluginAdapter for SqliteScheduleStore {
    fn name(&self) -> &str {
        "sqlite-schedules"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ScheduleStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(health_of(self.db.ping().await))
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn upsert(&self, schedule: &RetrySchedule) -> Result<ScheduleUpsert, HandoffError> {
        queries::schedules::upsert(&self.db, schedule, self.clock.now()).await
    }

    async fn delete(&self, name: &str) -> Result<bool, HandoffError> {
        queries::schedules::delete(&self.db, name).await
    }

    async fn get(&self, name: &str) -> Result<Option<RetrySchedule>, HandoffError> {
        queries::schedules::get(&self.db, name).await
    }

    async fn claim_due(&self, now: i64, limit: usize) -> Result<Vec<RetrySchedule>, HandoffError> {
        queries::schedules::claim_due(&self.db, now, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::types::{DeliveryStatus, TriggerReason, TriggerRequest};
    use tempfile::{TempDir, tempdir};

    async fn open_store() -> (TempDir, SqliteRecordStore) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db"), true).await.unwrap();
        (dir, SqliteRecordStore::new(db))
    }

    fn claimable(now: i64) -> TransitionGuard {
        TransitionGuard::Claimable {
            from: vec![DeliveryStatus::Sending, DeliveryStatus::Error],
            now,
        }
    }

    fn sending(lease: &str, now: i64) -> RecordUpdate {
        RecordUpdate {
            status: DeliveryStatus::Sending,
            lease_id: Some(lease.into()),
            lock_expires_at: Some(now + 300),
            sent_at: None,
            message_id: None,
            last_error: None,
            last_reason: None,
            now,
            ttl: now + 86_400,
            bump_attempts: true,
        }
    }

    fn sent(now: i64) -> RecordUpdate {
        RecordUpdate {
            status: DeliveryStatus::Sent,
            lease_id: None,
            lock_expires_at: None,
            sent_at: Some(now),
            message_id: Some("<m1@test>".into()),
            last_error: None,
            last_reason: Some("sent".into()),
            now,
            ttl: now + 86_400,
            bump_attempts: false,
        }
    }

    fn trigger(thread: &str) -> TriggerRequest {
        TriggerRequest {
            thread_id: thread.into(),
            locale: Some("en-US".into()),
            page_url: None,
            user: None,
            reason: TriggerReason::ServerRetry,
            attribution: None,
        }
    }

    #[tokio::test]
    async fn acquire_creates_record_then_blocks_second_claim() {
        let (_dir, store) = open_store().await;
        assert!(store.try_transition("cthr_a", &claimable(1000), &sending("l1", 1000)).await.unwrap());
        assert!(!store.try_transition("cthr_a", &claimable(1001), &sending("l2", 1001)).await.unwrap());

        let rec = store.get("cthr_a").await.unwrap().unwrap();
        assert_eq!(rec.status, DeliveryStatus::Sending);
        assert_eq!(rec.lease_id.as_deref(), Some("l1"));
        assert_eq!(rec.attempts, 1);
        assert_eq!(rec.created_at, 1000);
    }

    #[tokio::test]
    async fn expired_lease_can_be_taken_over() {
        let (_dir, store) = open_store().await;
        assert!(store.try_transition("cthr_a", &claimable(1000), &sending("l1", 1000)).await.unwrap());
        assert!(store.try_transition("cthr_a", &claimable(1300), &sending("l2", 1300)).await.unwrap());
        let rec = store.get("cthr_a").await.unwrap().unwrap();
        assert_eq!(rec.lease_id.as_deref(), Some("l2"));
        assert_eq!(rec.attempts, 2);
        assert_eq!(rec.created_at, 1000);
    }

    #[tokio::test]
    async fn finalize_requires_matching_lease() {
        let (_dir, store) = open_store().await;
        store.try_transition("cthr_a", &claimable(1000), &sending("l1", 1000)).await.unwrap();

        let wrong = TransitionGuard::HeldBy { lease_id: "other".into() };
        assert!(!store.try_transition("cthr_a", &wrong, &sent(1010)).await.unwrap());

        let right = TransitionGuard::HeldBy { lease_id: "l1".into() };
        assert!(store.try_transition("cthr_a", &right, &sent(1010)).await.unwrap());

        let rec = store.get("cthr_a").await.unwrap().unwrap();
        assert_eq!(rec.status, DeliveryStatus::Sent);
        assert_eq!(rec.sent_at, Some(1010));
        assert_eq!(rec.lease_id, None);
        assert_eq!(rec.message_id.as_deref(), Some("<m1@test>"));
    }

    #[tokio::test]
    async fn sent_is_terminal() {
        let (_dir, store) = open_store().await;
        store.try_transition("cthr_a", &claimable(1000), &sending("l1", 1000)).await.unwrap();
        let held = TransitionGuard::HeldBy { lease_id: "l1".into() };
        store.try_transition("cthr_a", &held, &sent(1010)).await.unwrap();

        // Far in the future, still not claimable.
        assert!(!store.try_transition("cthr_a", &claimable(99_999), &sending("l9", 99_999)).await.unwrap());
        // A stale finalize cannot resurrect it either.
        assert!(!store.try_transition("cthr_a", &held, &sending("l1", 1020)).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_acquire_has_single_winner() {
        let (_dir, store) = open_store().await;
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .try_transition("cthr_race", &claimable(5000), &sending(&format!("l{i}"), 5000))
                    .await
                    .unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let (_dir, store) = open_store().await;
        let mut short = sending("l1", 1000);
        short.ttl = 1500;
        store.try_transition("cthr_old", &claimable(1000), &short).await.unwrap();
        store.try_transition("cthr_new", &claimable(1000), &sending("l2", 1000)).await.unwrap();

        assert_eq!(store.purge_expired(2000).await.unwrap(), 1);
        assert!(store.get("cthr_old").await.unwrap().is_none());
        assert!(store.get("cthr_new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn attribution_is_first_touch() {
        let (_dir, store) = open_store().await;
        let first = AttributionEntry {
            thread_id: "cthr_a".into(),
            page_url: Some("https://example.com/landing".into()),
            locale: Some("en".into()),
            reason: TriggerReason::Idle,
            attribution: Some(serde_json::json!({"utm_source": "ads"})),
            recorded_at: 100,
        };
        let later = AttributionEntry {
            page_url: Some("https://example.com/other".into()),
            recorded_at: 200,
            ..first.clone()
        };
        assert!(store.record_attribution(&first).await.unwrap());
        assert!(!store.record_attribution(&later).await.unwrap());

        let stored = store.first_touch("cthr_a").await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert!(store.first_touch("cthr_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schedule_upsert_claim_delete() {
        let (_dir, records) = open_store().await;
        let schedules = SqliteScheduleStore::new(records.database().clone());
        let mut schedule = RetrySchedule {
            name: "handoff-retry-cthr_a".into(),
            thread_id: "cthr_a".into(),
            fire_at: 1000,
            payload: trigger("cthr_a"),
            enabled: true,
        };
        assert_eq!(schedules.upsert(&schedule).await.unwrap(), ScheduleUpsert::Created);

        schedule.fire_at = 1200;
        assert_eq!(schedules.upsert(&schedule).await.unwrap(), ScheduleUpsert::Updated);
        assert_eq!(schedules.get(&schedule.name).await.unwrap().unwrap().fire_at, 1200);

        assert!(schedules.claim_due(1100, 10).await.unwrap().is_empty());
        let due = schedules.claim_due(1200, 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].payload, trigger("cthr_a"));
        assert!(!due[0].enabled);
        // Claimed schedules are not handed out twice.
        assert!(schedules.claim_due(1300, 10).await.unwrap().is_empty());

        // Upsert re-enables a claimed schedule.
        assert_eq!(schedules.upsert(&schedule).await.unwrap(), ScheduleUpsert::Updated);
        assert_eq!(schedules.claim_due(1300, 10).await.unwrap().len(), 1);

        assert!(schedules.delete(&schedule.name).await.unwrap());
        assert!(!schedules.delete(&schedule.name).await.unwrap());
    }

    #[tokio::test]
    async fn health_checks_report_healthy() {
        let (_dir, store) = open_store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(store.adapter_type(), AdapterType::RecordStore);
    }
}

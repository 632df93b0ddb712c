// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory record, attribution and schedule stores.
//!
//! Each operation holds one lock for its whole read-check-write, which gives
//! the same compare-and-set semantics as the SQLite store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use handoff_core::types::{
    AdapterType, AttributionEntry, DedupeRecord, DeliveryStatus, HealthStatus, RecordUpdate,
    RetrySchedule, ScheduleUpsert, TransitionGuard,
};
use handoff_core::{AttributionLog, HandoffError, PluginAdapter, RecordStore, ScheduleStore};

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, DedupeRecord>>,
    attribution: Mutex<HashMap<String, AttributionEntry>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guard_holds(record: Option<&DedupeRecord>, guard: &TransitionGuard) -> bool {
    match (guard, record) {
        (TransitionGuard::Claimable { .. }, None) => true,
        (TransitionGuard::Claimable { from, now }, Some(r)) => {
            from.contains(&r.status) && r.lock_expires_at.is_none_or(|at| at <= *now)
        }
        (TransitionGuard::HeldBy { .. }, None) => false,
        (TransitionGuard::HeldBy { lease_id }, Some(r)) => {
            r.status == DeliveryStatus::Sending && r.lease_id.as_deref() == Some(lease_id.as_str())
        }
    }
}

#[async_trait]
impl PluginAdapter for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory-records"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::RecordStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, thread_id: &str) -> Result<Option<DedupeRecord>, HandoffError> {
        Ok(self.records.lock().await.get(thread_id).cloned())
    }

    async fn try_transition(
        &self,
        thread_id: &str,
        guard: &TransitionGuard,
        update: &RecordUpdate,
    ) -> Result<bool, HandoffError> {
        let mut records = self.records.lock().await;
        let existing = records.get(thread_id);
        if !guard_holds(existing, guard) {
            return Ok(false);
        }

        let bump = u32::from(update.bump_attempts);
        let next = match existing {
            Some(r) => DedupeRecord {
                status: update.status,
                lease_id: update.lease_id.clone(),
                lock_expires_at: update.lock_expires_at,
                updated_at: update.now,
                attempts: r.attempts + bump,
                sent_at: update.sent_at.or(r.sent_at),
                message_id: update.message_id.clone().or_else(|| r.message_id.clone()),
                last_error: update.last_error.clone(),
                last_reason: update.last_reason.clone(),
                ttl: update.ttl,
                ..r.clone()
            },
            None => DedupeRecord {
                thread_id: thread_id.to_string(),
                status: update.status,
                lease_id: update.lease_id.clone(),
                lock_expires_at: update.lock_expires_at,
                created_at: update.now,
                updated_at: update.now,
                attempts: bump,
                sent_at: update.sent_at,
                message_id: update.message_id.clone(),
                last_error: update.last_error.clone(),
                last_reason: update.last_reason.clone(),
                ttl: update.ttl,
            },
        };
        records.insert(thread_id.to_string(), next);
        Ok(true)
    }

    async fn purge_expired(&self, now: i64) -> Result<u64, HandoffError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| r.ttl > now);
        Ok((before - records.len()) as u64)
    }
}

#[async_trait]
impl AttributionLog for MemoryRecordStore {
    async fn record_attribution(&self, entry: &AttributionEntry) -> Result<bool, HandoffError> {
        let mut log = self.attribution.lock().await;
        if log.contains_key(&entry.thread_id) {
            return Ok(false);
        }
        log.insert(entry.thread_id.clone(), entry.clone());
        Ok(true)
    }

    async fn first_touch(&self, thread_id: &str) -> Result<Option<AttributionEntry>, HandoffError> {
        Ok(self.attribution.lock().await.get(thread_id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryScheduleStore {
    schedules: Mutex<HashMap<String, RetrySchedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginAdapter for MemoryScheduleStore {
    fn name(&self) -> &str {
        "memory-schedules"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ScheduleStore
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn upsert(&self, schedule: &RetrySchedule) -> Result<ScheduleUpsert, HandoffError> {
        let previous = self
            .schedules
            .lock()
            .await
            .insert(schedule.name.clone(), schedule.clone());
        Ok(match previous {
            Some(_) => ScheduleUpsert::Updated,
            None => ScheduleUpsert::Created,
        })
    }

    async fn delete(&self, name: &str) -> Result<bool, HandoffError> {
        Ok(self.schedules.lock().await.remove(name).is_some())
    }

    async fn get(&self, name: &str) -> Result<Option<RetrySchedule>, HandoffError> {
        Ok(self.schedules.lock().await.get(name).cloned())
    }

    async fn claim_due(&self, now: i64, limit: usize) -> Result<Vec<RetrySchedule>, HandoffError> {
        let mut schedules = self.schedules.lock().await;
        let mut due: Vec<&mut RetrySchedule> = schedules
            .values_mut()
            .filter(|s| s.enabled && s.fire_at <= now)
            .collect();
        due.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.name.cmp(&b.name)));
        Ok(due
            .into_iter()
            .take(limit)
            .map(|s| {
                s.enabled = false;
                s.clone()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use handoff_core::types::{TriggerReason, TriggerRequest};

    fn claim(now: i64, lease: &str) -> (TransitionGuard, RecordUpdate) {
        (
            TransitionGuard::Claimable {
                from: vec![DeliveryStatus::Sending, DeliveryStatus::Error],
                now,
            },
            RecordUpdate {
                status: DeliveryStatus::Sending,
                lease_id: Some(lease.to_string()),
                lock_expires_at: Some(now + 300),
                sent_at: None,
                message_id: None,
                last_error: None,
                last_reason: None,
                now,
                ttl: now + 1_000,
                bump_attempts: true,
            },
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn only_one_concurrent_claim_wins() {
        let store = Arc::new(MemoryRecordStore::new());
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let (guard, update) = claim(100, &format!("lease-{i}"));
                    store.try_transition("conv_1", &guard, &update).await.unwrap()
                })
            })
            .collect();
        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.get("conv_1").await.unwrap().unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn held_by_requires_the_exact_lease() {
        let store = MemoryRecordStore::new();
        let (guard, update) = claim(100, "mine");
        assert!(store.try_transition("conv_1", &guard, &update).await.unwrap());

        let finish = RecordUpdate {
            status: DeliveryStatus::Sent,
            lease_id: None,
            lock_expires_at: None,
            sent_at: Some(110),
            bump_attempts: false,
            ..update
        };
        let theirs = TransitionGuard::HeldBy {
            lease_id: "theirs".into(),
        };
        assert!(!store.try_transition("conv_1", &theirs, &finish).await.unwrap());
        let mine = TransitionGuard::HeldBy {
            lease_id: "mine".into(),
        };
        assert!(store.try_transition("conv_1", &mine, &finish).await.unwrap());

        // Sent is terminal for claims.
        let (guard, update) = claim(10_000, "later");
        assert!(!store.try_transition("conv_1", &guard, &update).await.unwrap());
    }

    #[tokio::test]
    async fn claim_due_disables_and_orders() {
        let store = MemoryScheduleStore::new();
        for (name, fire_at) in [("b", 20), ("a", 10), ("c", 99)] {
            let schedule = RetrySchedule {
                name: name.into(),
                thread_id: "conv_1".into(),
                fire_at,
                payload: TriggerRequest {
                    thread_id: "conv_1".into(),
                    locale: None,
                    page_url: None,
                    user: None,
                    reason: TriggerReason::ServerRetry,
                    attribution: None,
                },
                enabled: true,
            };
            assert_eq!(store.upsert(&schedule).await.unwrap(), ScheduleUpsert::Created);
        }
        let due = store.claim_due(50, 10).await.unwrap();
        let names: Vec<_> = due.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(store.claim_due(50, 10).await.unwrap().is_empty());
        assert!(!store.get("a").await.unwrap().unwrap().enabled);
    }
}

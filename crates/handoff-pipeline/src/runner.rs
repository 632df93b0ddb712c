// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process stand-in for a hosted delayed-invocation scheduler.
//!
//! Polls for due retry schedules, claims them, and re-invokes the
//! orchestrator with the stored payload. Each schedule fires once. The same
//! loop drives periodic purging of expired delivery records.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use handoff_core::{Clock, HandoffError, RecordStore, ScheduleStore};

use crate::orchestrator::DeliveryOrchestrator;

/// Schedules claimed per poll.
const CLAIM_BATCH: usize = 16;

pub struct RetryRunner {
    orchestrator: Arc<DeliveryOrchestrator>,
    schedules: Arc<dyn ScheduleStore>,
    records: Option<Arc<dyn RecordStore>>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    purge_interval: Duration,
}

impl RetryRunner {
    pub fn new(
        orchestrator: Arc<DeliveryOrchestrator>,
        schedules: Arc<dyn ScheduleStore>,
        records: Option<Arc<dyn RecordStore>>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        purge_interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            schedules,
            records,
            clock,
            poll_interval,
            purge_interval,
        }
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut poll = tokio::time::interval(self.poll_interval);
        let mut purge = tokio::time::interval(self.purge_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        purge.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            poll_secs = self.poll_interval.as_secs(),
            purge_secs = self.purge_interval.as_secs(),
            "retry runner started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = poll.tick() => {
                    if let Err(e) = self.fire_due().await {
                        error!(error = %e, "retry poll failed");
                    }
                }
                _ = purge.tick() => {
                    if let Err(e) = self.purge().await {
                        error!(error = %e, "record purge failed");
                    }
                }
            }
        }
        info!("retry runner stopped");
    }

    /// Fire every schedule due now. Returns how many were fired.
    pub async fn fire_due(&self) -> Result<usize, HandoffError> {
        let due = self
            .schedules
            .claim_due(self.clock.now(), CLAIM_BATCH)
            .await?;
        let count = due.len();

        for schedule in due {
            let request = schedule.payload.as_system_retry();
            match self.orchestrator.handle(request).await {
                Ok(outcome) => info!(
                    thread_id = %schedule.thread_id,
                    schedule = %schedule.name,
                    reason = %outcome.reason,
                    sent = outcome.sent,
                    "scheduled retry completed"
                ),
                Err(e) => warn!(
                    thread_id = %schedule.thread_id,
                    schedule = %schedule.name,
                    kind = %e.kind(),
                    error = %e,
                    "scheduled retry failed"
                ),
            }
            self.retire(&schedule.name).await;
        }
        Ok(count)
    }

    /// Delete a fired schedule unless a client trigger re-armed it meanwhile.
    async fn retire(&self, name: &str) {
        match self.schedules.get(name).await {
            Ok(Some(current)) if current.enabled => {
                debug!(schedule = name, "schedule re-armed during retry; keeping it");
            }
            Ok(Some(_)) => {
                if let Err(e) = self.schedules.delete(name).await {
                    warn!(schedule = name, error = %e, "failed to delete fired schedule");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(schedule = name, error = %e, "failed to read fired schedule"),
        }
    }

    /// Delete delivery records past their TTL.
    pub async fn purge(&self) -> Result<u64, HandoffError> {
        let Some(records) = &self.records else {
            return Ok(0);
        };
        let removed = records.purge_expired(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, "expired delivery records purged");
        }
        Ok(removed)
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry schedule persistence.

use handoff_core::HandoffError;
use handoff_core::types::{RetrySchedule, ScheduleUpsert, TriggerRequest};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

fn row_to_schedule(row: &Row<'_>) -> Result<RetrySchedule, rusqlite::Error> {
    let payload: String = row.get(3)?;
    let payload: TriggerRequest = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(RetrySchedule {
        name: row.get(0)?,
        thread_id: row.get(1)?,
        fire_at: row.get(2)?,
        payload,
        enabled: row.get(4)?,
    })
}

/// Insert or replace the named schedule, reporting which happened.
pub async fn upsert(
    db: &Database,
    schedule: &RetrySchedule,
    now: i64,
) -> Result<ScheduleUpsert, HandoffError> {
    let payload = serde_json::to_string(&schedule.payload).map_err(HandoffError::storage)?;
    let s = schedule.clone();

    db.connection()
        .call(move |conn| -> Result<ScheduleUpsert, rusqlite::Error> {
            let tx = conn.transaction()?;
            let existed = tx
                .query_row(
                    "SELECT 1 FROM retry_schedules WHERE name = ?1",
                    params![s.name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            tx.execute(
                "INSERT INTO retry_schedules
                    (name, thread_id, fire_at, payload, enabled, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT (name) DO UPDATE SET
                    thread_id = excluded.thread_id,
                    fire_at = excluded.fire_at,
                    payload = excluded.payload,
                    enabled = excluded.enabled,
                    updated_at = excluded.updated_at",
                params![s.name, s.thread_id, s.fire_at, payload, s.enabled, now],
            )?;
            tx.commit()?;
            Ok(if existed {
                ScheduleUpsert::Updated
            } else {
                ScheduleUpsert::Created
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete(db: &Database, name: &str) -> Result<bool, HandoffError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let n = conn.execute("DELETE FROM retry_schedules WHERE name = ?1", params![name])?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, name: &str) -> Result<Option<RetrySchedule>, HandoffError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<RetrySchedule>, rusqlite::Error> {
            conn.query_row(
                "SELECT name, thread_id, fire_at, payload, enabled
                 FROM retry_schedules WHERE name = ?1",
                params![name],
                row_to_schedule,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Disable and return due schedules in one transaction, oldest first.
pub async fn claim_due(
    db: &Database,
    now: i64,
    limit: usize,
) -> Result<Vec<RetrySchedule>, HandoffError> {
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<RetrySchedule>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let due = {
                let mut stmt = tx.prepare(
                    "SELECT name, thread_id, fire_at, payload, enabled
                     FROM retry_schedules
                     WHERE enabled = 1 AND fire_at <= ?1
                     ORDER BY fire_at ASC, name ASC
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![now, limit], row_to_schedule)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            for schedule in &due {
                tx.execute(
                    "UPDATE retry_schedules SET enabled = 0, updated_at = ?2 WHERE name = ?1",
                    params![schedule.name, now],
                )?;
            }
            tx.commit()?;
            Ok(due
                .into_iter()
                .map(|s| RetrySchedule { enabled: false, ..s })
                .collect())
        })
        .await
        .map_err(map_tr_err)
}

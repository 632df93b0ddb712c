// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery record reads and guarded writes.
//!
//! Each guarded write is a single statement whose `WHERE` clause is the
//! guard; `changes() == 1` means the guard held and the update applied.

use handoff_core::HandoffError;
use handoff_core::types::{DedupeRecord, DeliveryStatus, RecordUpdate, TransitionGuard};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

const SELECT_COLUMNS: &str = "thread_id, status, lease_id, lock_expires_at, created_at, \
     updated_at, attempts, sent_at, message_id, last_error, last_reason, ttl";

fn row_to_record(row: &Row<'_>) -> Result<DedupeRecord, rusqlite::Error> {
    let status: String = row.get(1)?;
    let status = status.parse::<DeliveryStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DedupeRecord {
        thread_id: row.get(0)?,
        status,
        lease_id: row.get(2)?,
        lock_expires_at: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        attempts: row.get(6)?,
        sent_at: row.get(7)?,
        message_id: row.get(8)?,
        last_error: row.get(9)?,
        last_reason: row.get(10)?,
        ttl: row.get(11)?,
    })
}

pub async fn get(db: &Database, thread_id: &str) -> Result<Option<DedupeRecord>, HandoffError> {
    let thread_id = thread_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<DedupeRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM delivery_records WHERE thread_id = ?1"),
                params![thread_id],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Apply `update` iff `guard` holds, atomically.
pub async fn try_transition(
    db: &Database,
    thread_id: &str,
    guard: &TransitionGuard,
    update: &RecordUpdate,
) -> Result<bool, HandoffError> {
    let thread_id = thread_id.to_string();
    let guard = guard.clone();
    let u = update.clone();
    let status = u.status.to_string();
    let bump: i64 = if u.bump_attempts { 1 } else { 0 };

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = match guard {
                TransitionGuard::Claimable { from, now } => {
                    // Status values come from the enum, never from input.
                    let allowed = from
                        .iter()
                        .map(|s| format!("'{s}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let sql = format!(
                        "INSERT INTO delivery_records
                            (thread_id, status, lease_id, lock_expires_at, created_at, updated_at,
                             attempts, sent_at, message_id, last_error, last_reason, ttl)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                         ON CONFLICT (thread_id) DO UPDATE SET
                            status = excluded.status,
                            lease_id = excluded.lease_id,
                            lock_expires_at = excluded.lock_expires_at,
                            updated_at = excluded.updated_at,
                            attempts = delivery_records.attempts + ?6,
                            sent_at = COALESCE(excluded.sent_at, delivery_records.sent_at),
                            message_id = COALESCE(excluded.message_id, delivery_records.message_id),
                            last_error = excluded.last_error,
                            last_reason = excluded.last_reason,
                            ttl = excluded.ttl
                         WHERE delivery_records.status IN ({allowed})
                           AND (delivery_records.lock_expires_at IS NULL
                                OR delivery_records.lock_expires_at <= ?12)"
                    );
                    conn.execute(
                        &sql,
                        params![
                            thread_id,
                            status,
                            u.lease_id,
                            u.lock_expires_at,
                            u.now,
                            bump,
                            u.sent_at,
                            u.message_id,
                            u.last_error,
                            u.last_reason,
                            u.ttl,
                            now,
                        ],
                    )?
                }
                TransitionGuard::HeldBy { lease_id } => conn.execute(
                    "UPDATE delivery_records SET
                        status = ?2,
                        lease_id = ?3,
                        lock_expires_at = ?4,
                        updated_at = ?5,
                        attempts = attempts + ?6,
                        sent_at = COALESCE(?7, sent_at),
                        message_id = COALESCE(?8, message_id),
                        last_error = ?9,
                        last_reason = ?10,
                        ttl = ?11
                     WHERE thread_id = ?1 AND status = 'sending' AND lease_id = ?12",
                    params![
                        thread_id,
                        status,
                        u.lease_id,
                        u.lock_expires_at,
                        u.now,
                        bump,
                        u.sent_at,
                        u.message_id,
                        u.last_error,
                        u.last_reason,
                        u.ttl,
                        lease_id,
                    ],
                )?,
            };
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn purge_expired(db: &Database, now: i64) -> Result<u64, HandoffError> {
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let n = conn.execute("DELETE FROM delivery_records WHERE ttl <= ?1", params![now])?;
            Ok(n as u64)
        })
        .await
        .map_err(map_tr_err)
}

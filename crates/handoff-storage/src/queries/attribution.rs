// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-touch attribution rows.

use handoff_core::HandoffError;
use handoff_core::types::AttributionEntry;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Insert unless the thread already has a row. Returns whether a row was written.
pub async fn record_first(db: &Database, entry: &AttributionEntry) -> Result<bool, HandoffError> {
    let attribution = entry
        .attribution
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(HandoffError::storage)?;
    let e = entry.clone();
    let reason = e.reason.to_string();

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let n = conn.execute(
                "INSERT OR IGNORE INTO attribution
                    (thread_id, page_url, locale, reason, attribution, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![e.thread_id, e.page_url, e.locale, reason, attribution, e.recorded_at],
            )?;
            Ok(n == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// The first-touch row for a thread, if any.
pub async fn first_touch(
    db: &Database,
    thread_id: &str,
) -> Result<Option<AttributionEntry>, HandoffError> {
    type RawRow = (String, Option<String>, Option<String>, String, Option<String>, i64);

    let thread_id = thread_id.to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<RawRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT thread_id, page_url, locale, reason, attribution, recorded_at
                 FROM attribution WHERE thread_id = ?1",
                params![thread_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    let Some((thread_id, page_url, locale, reason, raw, recorded_at)) = row else {
        return Ok(None);
    };
    let reason = reason.parse().map_err(HandoffError::storage)?;
    let attribution = raw
        .map(|r| serde_json::from_str(&r))
        .transpose()
        .map_err(HandoffError::storage)?;
    Ok(Some(AttributionEntry {
        thread_id,
        page_url,
        locale,
        reason,
        attribution,
        recorded_at,
    }))
}

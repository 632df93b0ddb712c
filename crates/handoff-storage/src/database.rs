// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management: pragmas, migrations, and the single writer.
//!
//! Every statement runs on tokio-rusqlite's one background thread, so
//! statements never interleave. The conditional writes in
//! [`crate::queries::records`] rely on that plus SQLite's own atomicity.

use std::path::Path;

use handoff_core::HandoffError;
use tracing::{debug, info};

use crate::migrations;

/// Shared handle to the service database. Cloning shares the writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply pragmas and
    /// run pending migrations.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, HandoffError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(HandoffError::storage)?;
            }
        }

        // Migrations need a plain connection; run them off the async runtime.
        let migrate_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), HandoffError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(HandoffError::storage)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| HandoffError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(map_tr_err)?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %path.display(), wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), HandoffError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("wal checkpoint complete");
        Ok(())
    }

    /// Cheap liveness probe.
    pub async fn ping(&self) -> Result<(), HandoffError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite failure into the storage error variant.
pub(crate) fn map_tr_err(e: impl std::fmt::Display) -> HandoffError {
    HandoffError::storage(e.to_string())
}

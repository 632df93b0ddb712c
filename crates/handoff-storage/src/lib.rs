// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the handoff pipeline.
//!
//! WAL-mode SQLite behind `tokio-rusqlite`'s single writer thread, with
//! embedded migrations. Provides the durable delivery-record store (the
//! lease compare-and-set), the retry schedule store, and the attribution log.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::{SqliteRecordStore, SqliteScheduleStore};
pub use database::Database;

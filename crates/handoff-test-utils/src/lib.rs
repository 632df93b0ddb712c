// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for handoff integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`TestHarness`] - Orchestrator over a temp SQLite database and mocks
//! - [`MemoryRecordStore`] - In-memory compare-and-set record store
//! - [`MockConversationApi`] - Pageable in-memory conversation
//! - [`MockSummarizer`] - Scripted readiness verdicts
//! - [`RecordingMailTransport`] - Captures outbound messages
//! - [`MockAttachmentFetcher`] - In-memory attachment bodies
//! - [`FixedClock`] - Settable clock

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_conversation;
pub mod mock_fetcher;
pub mod mock_summarizer;
pub mod mock_transport;

pub use clock::FixedClock;
pub use harness::{NOW, THREAD_ID, TestHarness, ready_transcript, request};
pub use memory_store::{MemoryRecordStore, MemoryScheduleStore};
pub use mock_conversation::{MockConversationApi, assistant, customer, customer_with_attachment};
pub use mock_fetcher::MockAttachmentFetcher;
pub use mock_summarizer::{MockSummarizer, Verdict, ready_summary};
pub use mock_transport::{RecordingMailTransport, SentMail};

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles a complete delivery orchestrator over a temp
//! SQLite database and mock external collaborators, with a pinned clock.
//! Provides `trigger()` to drive one invocation.

use std::sync::Arc;
use std::time::Duration;

use handoff_config::HandoffConfig;
use handoff_core::types::{ConversationItem, DedupeRecord, TriggerReason, TriggerRequest};
use handoff_core::{
    AttachmentFetcher, AttributionLog, Clock, HandoffError, MailTransport, RecordStore,
    ScheduleStore, Summarizer,
};
use handoff_pipeline::{DeliveryOrchestrator, HandoffOutcome, PipelineDeps, RetryRunner};
use handoff_storage::{Database, SqliteRecordStore, SqliteScheduleStore};

use crate::clock::FixedClock;
use crate::memory_store::{MemoryRecordStore, MemoryScheduleStore};
use crate::mock_conversation::{MockConversationApi, assistant, customer};
use crate::mock_fetcher::MockAttachmentFetcher;
use crate::mock_summarizer::MockSummarizer;
use crate::mock_transport::RecordingMailTransport;

/// Pinned "now" for every harness.
pub const NOW: i64 = 1_760_000_000;

/// Thread id every harness trigger targets.
pub const THREAD_ID: &str = "cthr_harness01";

/// A lead that is contactable, specific, and idle for ten minutes.
pub fn ready_transcript() -> Vec<ConversationItem> {
    vec![
        assistant("m1", NOW - 900, "Hi! How can we help with your project?"),
        customer(
            "m2",
            NOW - 840,
            "I'd like a quote for a kitchen remodel, starting next month.",
        ),
        assistant("m3", NOW - 780, "Great. What's the best way to reach you?"),
        customer("m4", NOW - 600, "Jane Doe, jane@example.com or (415) 555-0134"),
    ]
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    items: Vec<ConversationItem>,
    summarizer: Option<MockSummarizer>,
    fetcher: Option<MockAttachmentFetcher>,
    with_schedules: bool,
    with_transport: bool,
    in_memory: bool,
    config: HandoffConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = HandoffConfig::default();
        config.mail.enabled = true;
        config.mail.from = "Website Chat <chat@example.com>".to_string();
        config.mail.to = vec!["sales@example.com".to_string()];
        config.mail.business_phones = vec!["(800) 555-0100".to_string()];
        Self {
            items: ready_transcript(),
            summarizer: Some(MockSummarizer::ready()),
            fetcher: None,
            with_schedules: true,
            with_transport: true,
            in_memory: false,
            config,
        }
    }

    /// Replace the conversation items.
    pub fn with_items(mut self, items: Vec<ConversationItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_summarizer(mut self, summarizer: MockSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn without_summarizer(mut self) -> Self {
        self.summarizer = None;
        self
    }

    pub fn with_fetcher(mut self, fetcher: MockAttachmentFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn without_schedules(mut self) -> Self {
        self.with_schedules = false;
        self
    }

    pub fn without_transport(mut self) -> Self {
        self.with_transport = false;
        self
    }

    /// Use the in-memory stores instead of a temp SQLite database.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Adjust the configuration before the orchestrator is built.
    pub fn configure(mut self, f: impl FnOnce(&mut HandoffConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HandoffError> {
        let temp_dir = tempfile::TempDir::new().map_err(HandoffError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        let mut config = self.config;
        config.storage.database_path = db_path.to_string_lossy().into_owned();

        let clock = Arc::new(FixedClock::new(NOW));
        let (records, attribution, schedules): (
            Arc<dyn RecordStore>,
            Arc<dyn AttributionLog>,
            Arc<dyn ScheduleStore>,
        ) = if self.in_memory {
            let records = Arc::new(MemoryRecordStore::new());
            (
                records.clone() as Arc<dyn RecordStore>,
                records as Arc<dyn AttributionLog>,
                Arc::new(MemoryScheduleStore::new()) as Arc<dyn ScheduleStore>,
            )
        } else {
            let db = Database::open(&db_path, true).await?;
            let records = Arc::new(SqliteRecordStore::new(db.clone()));
            let schedules = SqliteScheduleStore::with_clock(db, clock.clone() as Arc<dyn Clock>);
            (
                records.clone() as Arc<dyn RecordStore>,
                records as Arc<dyn AttributionLog>,
                Arc::new(schedules) as Arc<dyn ScheduleStore>,
            )
        };
        let conversation = Arc::new(MockConversationApi::new(self.items));
        let summarizer = self.summarizer.map(Arc::new);
        let transport = Arc::new(RecordingMailTransport::new());
        let fetcher = self.fetcher.map(Arc::new);

        let deps = PipelineDeps {
            conversation: conversation.clone(),
            summarizer: summarizer.clone().map(|s| s as Arc<dyn Summarizer>),
            records: Some(records.clone()),
            attribution: Some(attribution.clone()),
            schedules: self.with_schedules.then(|| schedules.clone()),
            transport: self
                .with_transport
                .then(|| transport.clone() as Arc<dyn MailTransport>),
            fetcher: fetcher.clone().map(|f| f as Arc<dyn AttachmentFetcher>),
            clock: clock.clone(),
        };
        let orchestrator = Arc::new(DeliveryOrchestrator::new(&config, deps));

        Ok(TestHarness {
            clock,
            conversation,
            summarizer,
            transport,
            fetcher,
            records,
            attribution,
            schedules,
            orchestrator,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// Pinned clock shared by the orchestrator and schedule store.
    pub clock: Arc<FixedClock>,
    pub conversation: Arc<MockConversationApi>,
    pub summarizer: Option<Arc<MockSummarizer>>,
    pub transport: Arc<RecordingMailTransport>,
    pub fetcher: Option<Arc<MockAttachmentFetcher>>,
    /// Record store (temp SQLite DB unless built `in_memory`).
    pub records: Arc<dyn RecordStore>,
    pub attribution: Arc<dyn AttributionLog>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub orchestrator: Arc<DeliveryOrchestrator>,
    pub config: HandoffConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Trigger the pipeline for [`THREAD_ID`].
    pub async fn trigger(&self, reason: TriggerReason) -> Result<HandoffOutcome, HandoffError> {
        self.orchestrator.handle(request(reason)).await
    }

    /// The stored delivery record for [`THREAD_ID`].
    pub async fn record(&self) -> Option<DedupeRecord> {
        self.records.get(THREAD_ID).await.ok().flatten()
    }

    /// Summarizer calls so far; zero when no summarizer is wired.
    pub fn summarizer_calls(&self) -> usize {
        self.summarizer.as_ref().map_or(0, |s| s.calls())
    }

    /// A retry runner over this harness's stores.
    pub fn runner(&self) -> RetryRunner {
        RetryRunner::new(
            self.orchestrator.clone(),
            self.schedules.clone(),
            Some(self.records.clone()),
            self.clock.clone(),
            Duration::from_secs(self.config.pipeline.retry_poll_interval_secs),
            Duration::from_secs(self.config.pipeline.purge_interval_secs),
        )
    }
}

/// A widget trigger for [`THREAD_ID`].
pub fn request(reason: TriggerReason) -> TriggerRequest {
    TriggerRequest {
        thread_id: THREAD_ID.to_string(),
        locale: Some("en-US".to_string()),
        page_url: Some("https://example.com/kitchens?utm_source=google".to_string()),
        user: None,
        reason,
        attribution: None,
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delivery orchestrator: one invocation of the send-once pipeline.
//!
//! Order of checks, cheapest first:
//! record fast path, transcript, contact, warmth, summarizer, lease.
//! Nothing before the lease has side effects beyond attribution logging
//! and retry scheduling.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use handoff_attachments::AttachmentPipeline;
use handoff_config::HandoffConfig;
use handoff_conversation::TranscriptRetriever;
use handoff_core::types::{AttributionEntry, ThreadId, TriggerRequest};
use handoff_core::{
    AttachmentFetcher, AttributionLog, Clock, ConversationApi, HandoffError, MailTransport,
    RecordStore, ScheduleStore, Summarizer,
};
use handoff_email::{LeadNotification, MessageAssembler};

use crate::contact::ContactExtractor;
use crate::gate::{self, Readiness};
use crate::lease::{Acquire, LeaseManager, LeaseTimings, RecordState};
use crate::outcome::HandoffOutcome;
use crate::retry::{RetryScheduler, Warmth};

/// External collaborators. Optional ones may be absent in a given deployment;
/// the orchestrator reports what it cannot do rather than failing to build.
#[derive(Clone)]
pub struct PipelineDeps {
    pub conversation: Arc<dyn ConversationApi>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub records: Option<Arc<dyn RecordStore>>,
    pub attribution: Option<Arc<dyn AttributionLog>>,
    pub schedules: Option<Arc<dyn ScheduleStore>>,
    pub transport: Option<Arc<dyn MailTransport>>,
    pub fetcher: Option<Arc<dyn AttachmentFetcher>>,
    pub clock: Arc<dyn Clock>,
}

pub struct DeliveryOrchestrator {
    prefixes: Vec<String>,
    assistant_name: String,
    retriever: TranscriptRetriever,
    contacts: ContactExtractor,
    summarizer: Option<Arc<dyn Summarizer>>,
    lease: Option<LeaseManager>,
    attribution: Option<Arc<dyn AttributionLog>>,
    retry: RetryScheduler,
    attachments: AttachmentPipeline,
    assembler: MessageAssembler,
    transport: Option<Arc<dyn MailTransport>>,
    send_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl DeliveryOrchestrator {
    pub fn new(config: &HandoffConfig, deps: PipelineDeps) -> Self {
        let timings = LeaseTimings {
            lease_secs: config.pipeline.lease_secs as i64,
            cooldown_secs: config.pipeline.cooldown_secs as i64,
            retention_secs: i64::from(config.storage.record_retention_days) * 86_400,
        };
        let redactor = handoff_security::redactor_for(config);
        Self {
            prefixes: config.conversation.thread_id_prefixes.clone(),
            assistant_name: config.conversation.assistant_name.clone(),
            retriever: TranscriptRetriever::new(
                deps.conversation,
                config.conversation.page_size,
                config.conversation.max_pages,
            ),
            contacts: ContactExtractor::new(&config.mail.business_phones),
            summarizer: deps.summarizer,
            lease: deps
                .records
                .map(|store| LeaseManager::new(store, deps.clock.clone(), timings, redactor)),
            attribution: deps.attribution,
            retry: RetryScheduler::new(
                deps.schedules,
                config.pipeline.idle_threshold_secs as i64,
                config.pipeline.retry_margin_secs as i64,
            ),
            attachments: AttachmentPipeline::new(&config.attachments, deps.fetcher),
            assembler: MessageAssembler::new(&config.mail),
            transport: deps.transport,
            send_timeout: Duration::from_secs(config.mail.send_timeout_secs),
            clock: deps.clock,
        }
    }

    /// Run one invocation.
    ///
    /// Gating results come back as `Ok`; `Err` is reserved for bad input and
    /// infrastructure failures.
    pub async fn handle(&self, request: TriggerRequest) -> Result<HandoffOutcome, HandoffError> {
        let thread_id = ThreadId::parse(&request.thread_id, &self.prefixes)?;
        let lease = self.lease.as_ref().ok_or(HandoffError::StorageNotConfigured)?;

        let existing = lease.read(thread_id.as_str()).await?;
        if let Some(outcome) = fast_path(RecordState::of(existing.as_ref(), self.clock.now())) {
            debug!(thread_id = %thread_id, reason = %outcome.reason, "fast path");
            return Ok(outcome);
        }

        self.record_attribution(&thread_id, &request).await;
        let transport = self
            .transport
            .as_ref()
            .ok_or(HandoffError::TransportNotConfigured)?;

        let transcript = self.retriever.fetch(&thread_id).await?;
        if transcript.is_empty() {
            info!(thread_id = %thread_id, "empty transcript");
            return Ok(HandoffOutcome::empty_transcript());
        }

        let contact = self.contacts.extract(&transcript);
        if contact.is_empty() {
            info!(thread_id = %thread_id, "no customer contact in transcript");
            return Ok(HandoffOutcome::missing_contact());
        }

        if let Warmth::Warm { retry_at, .. } = self.retry.warmth(&transcript, self.clock.now()) {
            return self.defer(&thread_id, &request, retry_at).await;
        }

        let Some(summarizer) = &self.summarizer else {
            warn!(thread_id = %thread_id, "no summarizer configured; cannot judge readiness");
            return Ok(gate::unavailable());
        };
        let summary = match gate::evaluate(summarizer.summarize(&transcript).await?) {
            Readiness::Ready(summary) => summary,
            Readiness::NotReady(outcome) => {
                info!(
                    thread_id = %thread_id,
                    handoff_reason = ?outcome.handoff_reason,
                    "lead not ready for handoff"
                );
                return Ok(outcome);
            }
        };

        let lease_id = match lease.acquire(thread_id.as_str(), request.reason).await? {
            Acquire::Acquired { lease_id } => lease_id,
            Acquire::Busy(record) => {
                let state = RecordState::of(record.as_ref(), self.clock.now());
                return Ok(fast_path(state).unwrap_or_else(|| HandoffOutcome::in_progress(None)));
            }
        };

        let prepared = self.attachments.prepare(&transcript).await;
        let first_touch = self.first_touch(&thread_id).await;
        let rendered = self.assembler.build(
            &LeadNotification {
                thread_id: thread_id.as_str(),
                assistant_name: &self.assistant_name,
                transcript: &transcript,
                contact: &contact,
                summary: &summary,
                attachments: &prepared.refs,
                inline: &prepared.inline,
                attribution: first_touch.as_ref(),
            },
            chrono::DateTime::from_timestamp(self.clock.now(), 0).unwrap_or_default(),
        );

        let sent = match tokio::time::timeout(
            self.send_timeout,
            transport.send_raw(&rendered.envelope, &rendered.raw),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(HandoffError::Timeout {
                duration: self.send_timeout,
            }),
        };
        let receipt = match sent {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(thread_id = %thread_id, lease_id = %lease_id, error = %e, "notification send failed");
                if let Err(mark) = lease.mark_error(thread_id.as_str(), &lease_id, &e).await {
                    error!(thread_id = %thread_id, error = %mark, "failed to record send failure");
                }
                return Err(e);
            }
        };

        let message_id = receipt.message_id.unwrap_or(rendered.message_id);
        let sent_at = self.clock.now();
        // The message is out; a store failure here must not turn into a resend.
        if let Err(e) = lease
            .mark_sent(thread_id.as_str(), &lease_id, Some(&message_id))
            .await
        {
            error!(thread_id = %thread_id, error = %e, "failed to record successful send");
        }
        if let Err(e) = self.retry.cancel(thread_id.as_str()).await {
            warn!(thread_id = %thread_id, error = %e, "failed to remove retry schedule");
        }

        info!(
            thread_id = %thread_id,
            message_id = %message_id,
            attachments = prepared.refs.len(),
            inlined = prepared.inline.len(),
            "lead notification sent"
        );
        Ok(HandoffOutcome::sent(
            sent_at,
            Some(message_id),
            prepared.refs.len(),
            prepared.inline.len(),
        ))
    }

    async fn defer(
        &self,
        thread_id: &ThreadId,
        request: &TriggerRequest,
        retry_at: i64,
    ) -> Result<HandoffOutcome, HandoffError> {
        // A system retry that finds the chat warm again stops here; retries
        // never chain.
        if request.reason.is_system_retry() {
            info!(thread_id = %thread_id, "conversation warm on system retry; not rescheduling");
            return Ok(HandoffOutcome::not_idle(retry_at, false));
        }
        let scheduled = self.retry.defer(thread_id, request, retry_at).await?.is_some();
        Ok(HandoffOutcome::not_idle(retry_at, scheduled))
    }

    async fn record_attribution(&self, thread_id: &ThreadId, request: &TriggerRequest) {
        let Some(log) = &self.attribution else {
            return;
        };
        if request.attribution.is_none() && request.page_url.is_none() && request.locale.is_none() {
            return;
        }
        let entry = AttributionEntry {
            thread_id: thread_id.as_str().to_string(),
            page_url: request.page_url.clone(),
            locale: request.locale.clone(),
            reason: request.reason,
            attribution: request.attribution.clone(),
            recorded_at: self.clock.now(),
        };
        match log.record_attribution(&entry).await {
            Ok(true) => debug!(thread_id = %thread_id, "first-touch attribution recorded"),
            Ok(false) => {}
            Err(e) => warn!(thread_id = %thread_id, error = %e, "attribution not recorded"),
        }
    }

    async fn first_touch(&self, thread_id: &ThreadId) -> Option<AttributionEntry> {
        let log = self.attribution.as_ref()?;
        match log.first_touch(thread_id.as_str()).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(thread_id = %thread_id, error = %e, "attribution lookup failed");
                None
            }
        }
    }
}

fn fast_path(state: RecordState) -> Option<HandoffOutcome> {
    match state {
        RecordState::Sent {
            sent_at,
            message_id,
        } => Some(HandoffOutcome::already_sent(sent_at, message_id)),
        RecordState::InProgress { lock_expires_at } => {
            Some(HandoffOutcome::in_progress(Some(lock_expires_at)))
        }
        RecordState::Cooldown { lock_expires_at } => Some(HandoffOutcome::cooldown(lock_expires_at)),
        RecordState::Open => None,
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and pipeline stages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HandoffError;

/// Maximum accepted length of a conversation thread id.
const MAX_THREAD_ID_LEN: usize = 128;

/// Identifier of a conversation thread in the hosted conversation API.
///
/// The sole idempotency key of the pipeline. Construct with [`ThreadId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Validate a raw thread id against the accepted prefixes.
    ///
    /// The id must start with one of `prefixes`, carry a non-empty remainder,
    /// and contain only ASCII alphanumerics, `_` and `-`.
    pub fn parse(raw: &str, prefixes: &[String]) -> Result<Self, HandoffError> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(HandoffError::InvalidInput("threadId is required".into()));
        }
        if id.len() > MAX_THREAD_ID_LEN {
            return Err(HandoffError::InvalidInput(format!(
                "threadId exceeds {MAX_THREAD_ID_LEN} characters"
            )));
        }
        let rest = prefixes
            .iter()
            .find_map(|p| id.strip_prefix(p.as_str()))
            .ok_or_else(|| {
                HandoffError::InvalidInput(format!(
                    "threadId must start with one of: {}",
                    prefixes.join(", ")
                ))
            })?;
        if rest.is_empty()
            || !rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(HandoffError::InvalidInput(
                "threadId contains invalid characters".into(),
            ));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays in the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    Conversation,
    Summarizer,
    RecordStore,
    ScheduleStore,
    MailTransport,
    AttachmentFetcher,
}

// --- Trigger ---

/// Why the client (or the scheduler) fired the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    Idle,
    Pagehide,
    ChatClosed,
    /// System-originated re-invocation. Never schedules a further retry.
    ServerRetry,
}

impl TriggerReason {
    pub fn is_system_retry(self) -> bool {
        matches!(self, TriggerReason::ServerRetry)
    }
}

/// Inbound trigger payload, as posted by the chat widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub reason: TriggerReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<serde_json::Value>,
}

impl TriggerRequest {
    /// Copy of this request re-tagged as a system retry.
    pub fn as_system_retry(&self) -> Self {
        Self {
            reason: TriggerReason::ServerRetry,
            ..self.clone()
        }
    }
}

// --- Conversation API ---

/// Attachment metadata on a customer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAttachment {
    pub name: String,
    pub mime_type: Option<String>,
    pub url: Option<String>,
}

/// A single item from the conversation API, reduced to what the pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationItem {
    CustomerMessage {
        id: String,
        created_at: i64,
        text: String,
        attachments: Vec<ItemAttachment>,
    },
    AssistantMessage {
        id: String,
        created_at: i64,
        text: String,
    },
    /// Widgets, tool calls, and other item types the transcript ignores.
    Other { id: String, created_at: i64 },
}

/// One page of conversation items, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ItemPage {
    pub items: Vec<ConversationItem>,
    pub has_more: bool,
    /// Continuation cursor (id of the last item on this page).
    pub next_cursor: Option<String>,
}

// --- Transcript ---

/// Who authored a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Speaker {
    Customer,
    Assistant,
}

/// One normalized transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Epoch seconds as reported by the conversation API.
    pub timestamp: i64,
    pub speaker: Speaker,
    pub text: String,
}

/// Contact details found in customer-authored transcript lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

// --- Attachments ---

/// Prefix of the single-line attachment marker folded into transcript text.
pub const ATTACHMENT_MARKER: &str = "Attachment:";

/// An attachment referenced by a transcript marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub display_name: String,
    pub mime_type: Option<String>,
    pub url: String,
    /// Safe relative object key, if one could be recovered from the URL.
    pub storage_key: Option<String>,
}

/// Attachment bytes embedded in the outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    pub content_id: String,
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub source_url: String,
}

/// Body returned by an attachment fetch.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

// --- Summary ---

/// Why the summarizer did (or did not) declare the lead ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HandoffReason {
    ContactAndNeedCaptured,
    CustomerRequestedFollowUp,
    AppointmentRequested,
    MissingContact,
    MissingProjectDetails,
    ConversationInProgress,
    NotALead,
    #[serde(other)]
    Unknown,
}

/// Structured lead summary produced by the summarizer, after sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSummary {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub service: Option<String>,
    pub timeline: Option<String>,
    pub budget: Option<String>,
    pub preferred_contact: Option<String>,
    pub summary: Option<String>,
    pub handoff_ready: bool,
    pub handoff_reason: HandoffReason,
    pub next_steps: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub call_script: Vec<String>,
    pub missing_info: Vec<String>,
}

impl LeadSummary {
    /// A summary that declares nothing and is never ready.
    pub fn not_ready(reason: HandoffReason) -> Self {
        Self {
            name: None,
            email: None,
            phone: None,
            company: None,
            location: None,
            service: None,
            timeline: None,
            budget: None,
            preferred_contact: None,
            summary: None,
            handoff_ready: false,
            handoff_reason: reason,
            next_steps: Vec::new(),
            follow_up_questions: Vec::new(),
            call_script: Vec::new(),
            missing_info: Vec::new(),
        }
    }
}

/// Result of a summarizer call that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summary(LeadSummary),
    /// The response was missing or did not match the contract.
    Malformed(String),
}

// --- Dedupe / lease records ---

/// Delivery state of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sending,
    /// Terminal.
    Sent,
    Error,
}

/// Per-conversation idempotency and lease record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeRecord {
    pub thread_id: String,
    pub status: DeliveryStatus,
    /// Present only while `sending`.
    pub lease_id: Option<String>,
    pub lock_expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub attempts: u32,
    pub sent_at: Option<i64>,
    pub message_id: Option<String>,
    pub last_error: Option<String>,
    pub last_reason: Option<String>,
    /// Epoch seconds after which the store may reclaim the record.
    pub ttl: i64,
}

impl DedupeRecord {
    /// Whether a lease or cooldown is still in force at `now`.
    pub fn lock_active(&self, now: i64) -> bool {
        self.lock_expires_at.is_some_and(|at| at > now)
    }
}

/// Condition a conditional write must satisfy, evaluated atomically by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionGuard {
    /// Record absent, or its status is in `from` and its lock expired at or before `now`.
    Claimable { from: Vec<DeliveryStatus>, now: i64 },
    /// Record is `sending` under exactly this lease.
    HeldBy { lease_id: String },
}

/// Field values written when a guarded transition succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub status: DeliveryStatus,
    pub lease_id: Option<String>,
    pub lock_expires_at: Option<i64>,
    /// Written only when `Some`; otherwise the stored value is kept.
    pub sent_at: Option<i64>,
    /// Written only when `Some`; otherwise the stored value is kept.
    pub message_id: Option<String>,
    pub last_error: Option<String>,
    pub last_reason: Option<String>,
    pub now: i64,
    pub ttl: i64,
    pub bump_attempts: bool,
}

// --- Retry schedules ---

/// A deferred re-invocation of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySchedule {
    /// Deterministic name derived from the thread id.
    pub name: String,
    pub thread_id: String,
    /// Epoch seconds.
    pub fire_at: i64,
    pub payload: TriggerRequest,
    pub enabled: bool,
}

/// What an upsert did to the named schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleUpsert {
    Created,
    /// The name already existed; the schedule was re-enabled and re-timed.
    Updated,
}

// --- Attribution ---

/// First-touch attribution for a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionEntry {
    pub thread_id: String,
    pub page_url: Option<String>,
    pub locale: Option<String>,
    pub reason: TriggerReason,
    pub attribution: Option<serde_json::Value>,
    pub recorded_at: i64,
}

// --- Mail ---

/// SMTP envelope for a raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    pub from: String,
    pub to: Vec<String>,
}

/// What the transport reported after accepting a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Transport-assigned id, when the transport reports one.
    pub message_id: Option<String>,
}

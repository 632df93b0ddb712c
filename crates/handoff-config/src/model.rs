// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the handoff service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP trigger endpoint.
    #[serde(default)]
    pub server: ServerConfig,

    /// Durable store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Hosted conversation API.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Readiness summarizer.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Notification email and SMTP transport.
    #[serde(default)]
    pub mail: MailConfig,

    /// Attachment inlining limits.
    #[serde(default)]
    pub attachments: AttachmentsConfig,

    /// Gating, lease, and retry timings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Outbound network security.
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "handoff".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer secret required for HTTP triggers claiming `server_retry`.
    /// `None` rejects such triggers outright.
    #[serde(default)]
    pub retry_token: Option<String>,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            retry_token: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("retry_token", &self.retry_token.as_ref().map(|_| "[redacted]"))
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Days a delivery record is retained before it becomes eligible for purge.
    #[serde(default = "default_record_retention_days")]
    pub record_retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            record_retention_days: default_record_retention_days(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("handoff").join("handoff.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("handoff.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_record_retention_days() -> u32 {
    30
}

/// Hosted conversation API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Base URL of the conversation API.
    #[serde(default = "default_conversation_api_base")]
    pub api_base: String,

    /// API key. `None` requires the `HANDOFF_CONVERSATION_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard cap on pages fetched per transcript.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Per-request timeout.
    #[serde(default = "default_conversation_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Label used for assistant lines in the transcript.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Accepted thread id prefixes.
    #[serde(default = "default_thread_id_prefixes")]
    pub thread_id_prefixes: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            api_base: default_conversation_api_base(),
            api_key: None,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            request_timeout_secs: default_conversation_timeout_secs(),
            assistant_name: default_assistant_name(),
            thread_id_prefixes: default_thread_id_prefixes(),
        }
    }
}

impl std::fmt::Debug for ConversationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("assistant_name", &self.assistant_name)
            .field("thread_id_prefixes", &self.thread_id_prefixes)
            .finish()
    }
}

fn default_conversation_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    20
}

fn default_conversation_timeout_secs() -> u64 {
    15
}

fn default_assistant_name() -> String {
    "Assistant".to_string()
}

fn default_thread_id_prefixes() -> Vec<String> {
    vec!["conv_".to_string(), "cthr_".to_string()]
}

/// Readiness summarizer configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummarizerConfig {
    /// Enable the summarizer. When false every lead is treated as not ready.
    #[serde(default = "default_summarizer_enabled")]
    pub enabled: bool,

    /// Base URL of the chat completions API.
    #[serde(default = "default_summarizer_api_base")]
    pub api_base: String,

    /// API key. `None` disables the summarizer.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_summarizer_model")]
    pub model: String,

    /// Transcript characters sent to the model; longer transcripts keep head and tail.
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,

    /// Per-request timeout.
    #[serde(default = "default_summarizer_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_summarizer_enabled(),
            api_base: default_summarizer_api_base(),
            api_key: None,
            model: default_summarizer_model(),
            max_transcript_chars: default_max_transcript_chars(),
            request_timeout_secs: default_summarizer_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("enabled", &self.enabled)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("max_transcript_chars", &self.max_transcript_chars)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_summarizer_enabled() -> bool {
    true
}

fn default_summarizer_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_summarizer_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_max_transcript_chars() -> usize {
    24_000
}

fn default_summarizer_timeout_secs() -> u64 {
    45
}

/// SMTP connection security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Plain connection upgraded with STARTTLS (port 587).
    Starttls,
    /// Implicit TLS (port 465).
    Tls,
    /// No TLS. Local relays only.
    None,
}

/// Notification email configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// Enable the SMTP transport. When false no notification can be sent.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    #[serde(default = "default_smtp_tls")]
    pub tls: SmtpTls,

    /// Sender mailbox, e.g. `Leads <leads@example.com>`.
    #[serde(default = "default_mail_from")]
    pub from: String,

    /// Recipient mailboxes.
    #[serde(default)]
    pub to: Vec<String>,

    /// Subject prefix.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// The business's own numbers, never treated as customer contact.
    #[serde(default)]
    pub business_phones: Vec<String>,

    /// Timeout for one SMTP send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            tls: default_smtp_tls(),
            from: default_mail_from(),
            to: Vec::new(),
            subject_prefix: default_subject_prefix(),
            business_phones: Vec::new(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field(
                "smtp_password",
                &self.smtp_password.as_ref().map(|_| "[redacted]"),
            )
            .field("tls", &self.tls)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject_prefix", &self.subject_prefix)
            .field("business_phones", &self.business_phones)
            .field("send_timeout_secs", &self.send_timeout_secs)
            .finish()
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> SmtpTls {
    SmtpTls::Starttls
}

fn default_mail_from() -> String {
    "Website Chat <chat@localhost>".to_string()
}

fn default_subject_prefix() -> String {
    "New chat lead:".to_string()
}

fn default_send_timeout_secs() -> u64 {
    30
}

/// Attachment inlining configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentsConfig {
    /// Embed image attachments in the email. When false all attachments are links.
    #[serde(default = "default_inline_enabled")]
    pub inline_enabled: bool,

    /// Per-attachment ceiling in bytes.
    #[serde(default = "default_max_inline_bytes")]
    pub max_inline_bytes: u64,

    /// Ceiling across all inlined attachments in one message.
    #[serde(default = "default_max_total_inline_bytes")]
    pub max_total_inline_bytes: u64,

    /// Maximum number of inlined attachments.
    #[serde(default = "default_max_inline_count")]
    pub max_inline_count: usize,

    /// Per-fetch timeout.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Concurrent fetches.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            inline_enabled: default_inline_enabled(),
            max_inline_bytes: default_max_inline_bytes(),
            max_total_inline_bytes: default_max_total_inline_bytes(),
            max_inline_count: default_max_inline_count(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

fn default_inline_enabled() -> bool {
    true
}

fn default_max_inline_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_max_total_inline_bytes() -> u64 {
    8 * 1024 * 1024
}

fn default_max_inline_count() -> usize {
    8
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_fetch_concurrency() -> usize {
    4
}

/// Gating, lease, and retry timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Seconds of transcript inactivity before a conversation counts as idle.
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,

    /// Extra seconds added to a deferred retry's target time.
    #[serde(default = "default_retry_margin_secs")]
    pub retry_margin_secs: u64,

    /// Lease duration. Must comfortably exceed worst-case pipeline latency.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    /// Lock extension applied after a failed send.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How often the schedule runner polls for due retries.
    #[serde(default = "default_retry_poll_interval_secs")]
    pub retry_poll_interval_secs: u64,

    /// How often expired records are purged.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            idle_threshold_secs: default_idle_threshold_secs(),
            retry_margin_secs: default_retry_margin_secs(),
            lease_secs: default_lease_secs(),
            cooldown_secs: default_cooldown_secs(),
            retry_poll_interval_secs: default_retry_poll_interval_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

fn default_idle_threshold_secs() -> u64 {
    300
}

fn default_retry_margin_secs() -> u64 {
    20
}

fn default_lease_secs() -> u64 {
    300
}

fn default_cooldown_secs() -> u64 {
    90
}

fn default_retry_poll_interval_secs() -> u64 {
    15
}

fn default_purge_interval_secs() -> u64 {
    3600
}

/// Outbound network security configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Private IP addresses exempt from SSRF blocking (e.g., a local object store).
    #[serde(default)]
    pub allowed_private_ips: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let mut config = HandoffConfig::default();
        config.mail.smtp_password = Some("hunter2".into());
        config.summarizer.api_key = Some("sk-secret".into());
        config.conversation.api_key = Some("sk-conv".into());
        config.server.retry_token = Some("tok".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("sk-conv"));
        assert!(!debug.contains("\"tok\""));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn smtp_tls_deserializes_lowercase() {
        let mail: MailConfig = toml::from_str("tls = \"none\"").unwrap();
        assert_eq!(mail.tls, SmtpTls::None);
        assert!(toml::from_str::<MailConfig>("tls = \"ssl\"").is_err());
    }
}

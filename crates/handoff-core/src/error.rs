// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the handoff notification pipeline.

use std::time::Duration;

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Boxed source error carried by infrastructure variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Configuration errors (invalid TOML, missing credentials, bad addresses).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed trigger payload or an invalid conversation thread id.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Durable store failure (connection, query, serialization).
    #[error("storage error: {source}")]
    Storage {
        /// The underlying driver or connection error.
        source: BoxError,
    },

    /// No durable store is wired in, so delivery cannot be made idempotent.
    #[error("durable record store is not configured")]
    StorageNotConfigured,

    /// No email transport is wired in.
    #[error("email transport is not configured")]
    TransportNotConfigured,

    /// A conditional write was rejected by the store.
    #[error("conditional write rejected for {key}")]
    ConditionFailed {
        /// The record key whose guard did not hold.
        key: String,
    },

    /// Conversation API failure (HTTP error, unexpected payload).
    #[error("conversation api error: {message}")]
    Conversation {
        /// What went wrong, safe to log.
        message: String,
        /// The HTTP or decode error, when there is one.
        source: Option<BoxError>,
    },

    /// Summarizer call failure (HTTP error, refused request).
    #[error("summarizer error: {message}")]
    Summarizer {
        /// What went wrong, safe to log.
        message: String,
        /// The HTTP or decode error, when there is one.
        source: Option<BoxError>,
    },

    /// Email transport failure.
    #[error("email transport error: {message}")]
    Transport {
        /// What went wrong, safe to log.
        message: String,
        /// The SMTP error, when there is one.
        source: Option<BoxError>,
    },

    /// Attachment body exceeded the configured ceiling.
    #[error("attachment too large: {size} bytes exceeds {limit}")]
    TooLarge {
        /// Bytes received or declared so far.
        size: u64,
        /// The ceiling that was exceeded.
        limit: u64,
    },

    /// Attachment type cannot be inlined.
    #[error("unsupported attachment type: {mime}")]
    UnsupportedType {
        /// The resolved MIME type.
        mime: String,
    },

    /// Attachment fetch failed (network error, non-success status, empty body).
    #[error("attachment fetch failed: {message}")]
    Fetch {
        /// What went wrong, safe to log.
        message: String,
        /// The HTTP error, when there is one.
        source: Option<BoxError>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The bound that elapsed.
        duration: Duration,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Machine-readable error tag.
///
/// Callers branch on this rather than on error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Config,
    InvalidInput,
    Storage,
    StorageNotConfigured,
    TransportNotConfigured,
    ConditionFailed,
    Conversation,
    Summarizer,
    Transport,
    TooLarge,
    UnsupportedType,
    Fetch,
    Timeout,
    Internal,
}

impl ErrorKind {
    /// Whether a later trigger may succeed where this one failed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Storage
                | ErrorKind::Conversation
                | ErrorKind::Summarizer
                | ErrorKind::Transport
                | ErrorKind::Fetch
                | ErrorKind::Timeout
        )
    }

    /// Stable string form, used in HTTP error bodies and stored error records.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl HandoffError {
    /// Returns the tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandoffError::Config(_) => ErrorKind::Config,
            HandoffError::InvalidInput(_) => ErrorKind::InvalidInput,
            HandoffError::Storage { .. } => ErrorKind::Storage,
            HandoffError::StorageNotConfigured => ErrorKind::StorageNotConfigured,
            HandoffError::TransportNotConfigured => ErrorKind::TransportNotConfigured,
            HandoffError::ConditionFailed { .. } => ErrorKind::ConditionFailed,
            HandoffError::Conversation { .. } => ErrorKind::Conversation,
            HandoffError::Summarizer { .. } => ErrorKind::Summarizer,
            HandoffError::Transport { .. } => ErrorKind::Transport,
            HandoffError::TooLarge { .. } => ErrorKind::TooLarge,
            HandoffError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            HandoffError::Fetch { .. } => ErrorKind::Fetch,
            HandoffError::Timeout { .. } => ErrorKind::Timeout,
            HandoffError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a storage error from any source.
    pub fn storage(source: impl Into<BoxError>) -> Self {
        HandoffError::Storage {
            source: source.into(),
        }
    }

    /// Shorthand for a fetch error without a source.
    pub fn fetch(message: impl Into<String>) -> Self {
        HandoffError::Fetch {
            message: message.into(),
            source: None,
        }
    }
}

/// Truncate an error message to at most `max_chars` characters for storage.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut out: String = message.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

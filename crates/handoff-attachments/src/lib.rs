// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment handling for lead notifications.
//!
//! Attachments reach the pipeline only as text markers in the transcript.
//! This crate parses them back into references, screens their URLs, and
//! fetches image bodies for embedding. Nothing here is fatal to a send.

pub mod fetcher;
pub mod inline;
pub mod keys;
pub mod markers;
pub mod mime;

use std::sync::Arc;

use tracing::info;

use handoff_config::model::AttachmentsConfig;
use handoff_core::AttachmentFetcher;
use handoff_core::types::{AttachmentRef, InlineAttachment, TranscriptLine};

pub use fetcher::HttpAttachmentFetcher;
pub use inline::{InlineLimits, Inliner};
pub use markers::{extract_attachments, parse_marker};

/// Everything the message assembler needs about attachments.
#[derive(Debug, Clone, Default)]
pub struct PreparedAttachments {
    /// Every screened reference, shown as links.
    pub refs: Vec<AttachmentRef>,
    /// The subset embedded inline.
    pub inline: Vec<InlineAttachment>,
}

/// Marker extraction plus optional inlining.
pub struct AttachmentPipeline {
    inliner: Option<Inliner>,
}

impl AttachmentPipeline {
    /// Without a fetcher, or with inlining disabled, every attachment is link-only.
    pub fn new(config: &AttachmentsConfig, fetcher: Option<Arc<dyn AttachmentFetcher>>) -> Self {
        let inliner = fetcher
            .filter(|_| config.inline_enabled)
            .map(|f| Inliner::new(f, InlineLimits::from(config)));
        Self { inliner }
    }

    pub async fn prepare(&self, lines: &[TranscriptLine]) -> PreparedAttachments {
        let refs = extract_attachments(lines);
        let inline = match &self.inliner {
            Some(inliner) if !refs.is_empty() => inliner.inline_all(&refs).await,
            _ => Vec::new(),
        };
        if !refs.is_empty() {
            info!(
                attachments = refs.len(),
                inlined = inline.len(),
                "attachments prepared"
            );
        }
        PreparedAttachments { refs, inline }
    }
}

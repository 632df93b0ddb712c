// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment byte fetcher trait (object store over HTTP).

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::FetchedBody;

/// Fetches attachment bytes by URL.
#[async_trait]
pub trait AttachmentFetcher: PluginAdapter {
    /// Fetches `url`, failing with [`HandoffError::TooLarge`] as soon as the
    /// body is known to exceed `max_bytes`.
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedBody, HandoffError>;
}

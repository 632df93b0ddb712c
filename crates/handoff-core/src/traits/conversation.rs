// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation API adapter trait (hosted chat transcripts).

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ItemPage, ThreadId};

/// Paged, oldest-first access to a conversation's items.
///
/// The hosted conversation service is the system of record; nothing
/// returned here is cached between invocations.
#[async_trait]
pub trait ConversationApi: PluginAdapter {
    /// Lists up to `limit` items after `after` (exclusive), oldest first.
    async fn list_items(
        &self,
        thread_id: &ThreadId,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ItemPage, HandoffError>;
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock conversation API serving a fixed, pageable item list.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use handoff_core::types::{
    AdapterType, ConversationItem, HealthStatus, ItemAttachment, ItemPage, ThreadId,
};
use handoff_core::{ConversationApi, HandoffError, PluginAdapter};

/// Serves `items` oldest first, honoring `after` cursors and page limits.
pub struct MockConversationApi {
    items: Arc<Mutex<Vec<ConversationItem>>>,
    calls: AtomicUsize,
}

impl MockConversationApi {
    pub fn new(items: Vec<ConversationItem>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append an item, as if the customer kept chatting.
    pub async fn push(&self, item: ConversationItem) {
        self.items.lock().await.push(item);
    }

    /// Number of `list_items` calls served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn item_id(item: &ConversationItem) -> &str {
    match item {
        ConversationItem::CustomerMessage { id, .. }
        | ConversationItem::AssistantMessage { id, .. }
        | ConversationItem::Other { id, .. } => id,
    }
}

#[async_trait]
impl PluginAdapter for MockConversationApi {
    fn name(&self) -> &str {
        "mock-conversation"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Conversation
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ConversationApi for MockConversationApi {
    async fn list_items(
        &self,
        _thread_id: &ThreadId,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ItemPage, HandoffError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().await;
        let start = match after {
            Some(cursor) => items
                .iter()
                .position(|item| item_id(item) == cursor)
                .map_or(items.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + limit as usize).min(items.len());
        let page: Vec<ConversationItem> = items[start..end].to_vec();
        Ok(ItemPage {
            next_cursor: page.last().map(|item| item_id(item).to_string()),
            has_more: end < items.len(),
            items: page,
        })
    }
}

/// Customer message fixture.
pub fn customer(id: &str, created_at: i64, text: &str) -> ConversationItem {
    ConversationItem::CustomerMessage {
        id: id.to_string(),
        created_at,
        text: text.to_string(),
        attachments: Vec::new(),
    }
}

/// Customer message carrying one attachment.
pub fn customer_with_attachment(
    id: &str,
    created_at: i64,
    text: &str,
    name: &str,
    mime_type: &str,
    url: &str,
) -> ConversationItem {
    ConversationItem::CustomerMessage {
        id: id.to_string(),
        created_at,
        text: text.to_string(),
        attachments: vec![ItemAttachment {
            name: name.to_string(),
            mime_type: Some(mime_type.to_string()),
            url: Some(url.to_string()),
        }],
    }
}

/// Assistant message fixture.
pub fn assistant(id: &str, created_at: i64, text: &str) -> ConversationItem {
    ConversationItem::AssistantMessage {
        id: id.to_string(),
        created_at,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread() -> ThreadId {
        ThreadId::parse("cthr_test", &["cthr_".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn pages_follow_the_cursor() {
        let api = MockConversationApi::new(vec![
            customer("a", 1, "one"),
            assistant("b", 2, "two"),
            customer("c", 3, "three"),
        ]);

        let first = api.list_items(&thread(), None, 2).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.next_cursor.as_deref(), Some("b"));

        let second = api.list_items(&thread(), Some("b"), 2).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert!(!second.has_more);
        assert_eq!(api.calls(), 2);
    }
}

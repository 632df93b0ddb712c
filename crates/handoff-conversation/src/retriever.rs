// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds a normalized transcript from paged conversation items.
//!
//! Attachment metadata is folded into single-line text markers so that
//! everything downstream works from transcript text alone.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use handoff_core::types::{
    ATTACHMENT_MARKER, ConversationItem, ItemAttachment, Speaker, ThreadId, TranscriptLine,
};
use handoff_core::{ConversationApi, HandoffError};

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// Pages through a thread and normalizes it into transcript lines.
pub struct TranscriptRetriever {
    api: Arc<dyn ConversationApi>,
    page_size: u32,
    max_pages: u32,
}

impl TranscriptRetriever {
    pub fn new(api: Arc<dyn ConversationApi>, page_size: u32, max_pages: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Fetch the whole thread (up to the page cap), oldest first.
    pub async fn fetch(&self, thread_id: &ThreadId) -> Result<Vec<TranscriptLine>, HandoffError> {
        let mut lines = Vec::new();
        let mut cursor: Option<String> = None;

        for page_no in 0..self.max_pages {
            let page = self
                .api
                .list_items(thread_id, cursor.as_deref(), self.page_size)
                .await?;
            debug!(
                thread_id = %thread_id,
                page = page_no,
                items = page.items.len(),
                has_more = page.has_more,
                "fetched conversation page"
            );

            lines.extend(page.items.into_iter().filter_map(normalize_item));

            if !page.has_more {
                return Ok(lines);
            }
            match page.next_cursor {
                // A cursor that does not advance would loop until the page cap.
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => {
                    warn!(thread_id = %thread_id, "conversation api stopped advancing; truncating transcript");
                    return Ok(lines);
                }
            }
        }

        warn!(
            thread_id = %thread_id,
            max_pages = self.max_pages,
            "page cap reached; transcript truncated"
        );
        Ok(lines)
    }
}

/// Convert one item into a transcript line, or drop it.
pub fn normalize_item(item: ConversationItem) -> Option<TranscriptLine> {
    let (timestamp, speaker, text) = match item {
        ConversationItem::CustomerMessage {
            created_at,
            text,
            attachments,
            ..
        } => {
            let mut text = text;
            for attachment in &attachments {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&attachment_marker(attachment));
            }
            (created_at, Speaker::Customer, text)
        }
        ConversationItem::AssistantMessage {
            created_at, text, ..
        } => (created_at, Speaker::Assistant, text),
        ConversationItem::Other { .. } => return None,
    };

    let text = normalize_text(&text);
    if text.is_empty() {
        return None;
    }
    Some(TranscriptLine {
        timestamp,
        speaker,
        text,
    })
}

/// `Attachment: <name> (<mime>) <url>`; absent parts are omitted.
pub fn attachment_marker(attachment: &ItemAttachment) -> String {
    let name = WHITESPACE_RUN
        .replace_all(attachment.name.trim(), " ")
        .into_owned();
    let name = if name.is_empty() { "attachment".to_string() } else { name };

    let mut marker = format!("{ATTACHMENT_MARKER} {name}");
    if let Some(mime) = attachment.mime_type.as_deref().map(str::trim) {
        if !mime.is_empty() {
            marker.push_str(&format!(" ({mime})"));
        }
    }
    if let Some(url) = attachment.url.as_deref().map(str::trim) {
        if !url.is_empty() {
            marker.push(' ');
            marker.push_str(url);
        }
    }
    marker
}

/// CRLF and CR become LF, runs of three or more newlines become two, ends trimmed.
pub fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    EXCESS_NEWLINES
        .replace_all(&unified, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use handoff_core::types::ItemPage;
    use handoff_core::{AdapterType, HealthStatus, PluginAdapter};
    use std::sync::Mutex;

    /// Serves a fixed list of pages and records the cursors it was asked for.
    struct PagedApi {
        pages: Vec<ItemPage>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl PluginAdapter for PagedApi {
        fn name(&self) -> &str {
            "paged"
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Conversation
        }
        async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl ConversationApi for PagedApi {
        async fn list_items(
            &self,
            _thread_id: &ThreadId,
            after: Option<&str>,
            _limit: u32,
        ) -> Result<ItemPage, HandoffError> {
            let mut cursors = self.cursors.lock().unwrap();
            let idx = cursors.len();
            cursors.push(after.map(String::from));
            Ok(self.pages.get(idx).cloned().unwrap_or_default())
        }
    }

    fn customer(id: &str, at: i64, text: &str) -> ConversationItem {
        ConversationItem::CustomerMessage {
            id: id.into(),
            created_at: at,
            text: text.into(),
            attachments: vec![],
        }
    }

    fn thread() -> ThreadId {
        ThreadId::parse("cthr_x", &["cthr_".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn follows_cursor_across_pages() {
        let api = Arc::new(PagedApi {
            pages: vec![
                ItemPage {
                    items: vec![customer("a", 1, "one")],
                    has_more: true,
                    next_cursor: Some("a".into()),
                },
                ItemPage {
                    items: vec![customer("b", 2, "two")],
                    has_more: false,
                    next_cursor: Some("b".into()),
                },
            ],
            cursors: Mutex::new(vec![]),
        });
        let retriever = TranscriptRetriever::new(api.clone(), 100, 20);
        let lines = retriever.fetch(&thread()).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "two");
        assert_eq!(*api.cursors.lock().unwrap(), vec![None, Some("a".to_string())]);
    }

    #[tokio::test]
    async fn stops_at_page_cap() {
        let endless: Vec<ItemPage> = (0..10)
            .map(|i| ItemPage {
                items: vec![customer(&format!("i{i}"), i, "msg")],
                has_more: true,
                next_cursor: Some(format!("i{i}")),
            })
            .collect();
        let api = Arc::new(PagedApi {
            pages: endless,
            cursors: Mutex::new(vec![]),
        });
        let retriever = TranscriptRetriever::new(api.clone(), 1, 3);
        let lines = retriever.fetch(&thread()).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(api.cursors.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stalled_cursor_terminates() {
        let stuck = ItemPage {
            items: vec![customer("a", 1, "x")],
            has_more: true,
            next_cursor: Some("a".into()),
        };
        let api = Arc::new(PagedApi {
            pages: vec![stuck.clone(), stuck.clone(), stuck],
            cursors: Mutex::new(vec![]),
        });
        let retriever = TranscriptRetriever::new(api.clone(), 1, 20);
        retriever.fetch(&thread()).await.unwrap();
        assert_eq!(api.cursors.lock().unwrap().len(), 2);
    }

    #[test]
    fn normalizes_whitespace_and_drops_empty() {
        assert_eq!(normalize_text("a\r\nb\r\n\r\n\r\n\r\nc  "), "a\nb\n\nc");
        assert!(normalize_item(customer("e", 1, " \r\n ")).is_none());
        assert!(
            normalize_item(ConversationItem::Other {
                id: "w".into(),
                created_at: 1
            })
            .is_none()
        );
    }

    #[test]
    fn attachment_markers_are_appended() {
        let item = ConversationItem::CustomerMessage {
            id: "m".into(),
            created_at: 7,
            text: "see photo".into(),
            attachments: vec![
                ItemAttachment {
                    name: "  back   yard.jpg ".into(),
                    mime_type: Some("image/jpeg".into()),
                    url: Some("https://files.example.com/u/1.jpg".into()),
                },
                ItemAttachment {
                    name: "notes".into(),
                    mime_type: None,
                    url: Some("https://files.example.com/u/2".into()),
                },
            ],
        };
        let line = normalize_item(item).unwrap();
        assert_eq!(line.speaker, Speaker::Customer);
        assert_eq!(
            line.text,
            "see photo\n\
             Attachment: back yard.jpg (image/jpeg) https://files.example.com/u/1.jpg\n\
             Attachment: notes https://files.example.com/u/2"
        );
    }

    #[test]
    fn attachment_only_message_keeps_marker() {
        let item = ConversationItem::CustomerMessage {
            id: "m".into(),
            created_at: 7,
            text: String::new(),
            attachments: vec![ItemAttachment {
                name: "a.png".into(),
                mime_type: Some("image/png".into()),
                url: Some("https://x.example/a.png".into()),
            }],
        };
        assert_eq!(
            normalize_item(item).unwrap().text,
            "Attachment: a.png (image/png) https://x.example/a.png"
        );
    }
}

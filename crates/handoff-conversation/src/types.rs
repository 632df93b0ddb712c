// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the hosted conversation API's item listing.

use handoff_core::types::{ConversationItem, ItemAttachment, ItemPage};
use serde::Deserialize;

/// `GET /chatkit/threads/{id}/items` response.
#[derive(Debug, Deserialize)]
pub struct ItemListResponse {
    #[serde(default)]
    pub data: Vec<RawItem>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

/// Item timestamps arrive as epoch seconds or as RFC 3339 strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    EpochFloat(f64),
    Text(String),
}

impl RawTimestamp {
    fn to_epoch(&self) -> i64 {
        match self {
            RawTimestamp::Epoch(n) => *n,
            RawTimestamp::EpochFloat(f) => *f as i64,
            RawTimestamp::Text(s) => chrono::DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.timestamp())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
    #[serde(default)]
    pub content: Vec<RawContent>,
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
pub struct RawContent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAttachment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Standard error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl RawItem {
    fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter(|c| matches!(c.kind.as_str(), "input_text" | "output_text" | "text"))
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_item(self) -> ConversationItem {
        let created_at = self.created_at.as_ref().map(RawTimestamp::to_epoch).unwrap_or_default();
        match self.kind.as_str() {
            "chatkit.user_message" | "user_message" => ConversationItem::CustomerMessage {
                text: self.joined_text(),
                attachments: self
                    .attachments
                    .into_iter()
                    .map(|a| ItemAttachment {
                        name: a.name.unwrap_or_else(|| "attachment".to_string()),
                        mime_type: a.mime_type.filter(|m| !m.trim().is_empty()),
                        url: a.url.or(a.preview_url).filter(|u| !u.trim().is_empty()),
                    })
                    .collect(),
                id: self.id,
                created_at,
            },
            "chatkit.assistant_message" | "assistant_message" => {
                ConversationItem::AssistantMessage {
                    text: self.joined_text(),
                    id: self.id,
                    created_at,
                }
            }
            _ => ConversationItem::Other {
                id: self.id,
                created_at,
            },
        }
    }
}

impl From<ItemListResponse> for ItemPage {
    fn from(resp: ItemListResponse) -> Self {
        let next_cursor = resp
            .last_id
            .or_else(|| resp.data.last().map(|item| item.id.clone()));
        ItemPage {
            items: resp.data.into_iter().map(RawItem::into_item).collect(),
            has_more: resp.has_more,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_user_and_assistant_items() {
        let body = serde_json::json!({
            "data": [
                {
                    "id": "cthr_item_1",
                    "type": "chatkit.user_message",
                    "created_at": 1_700_000_000,
                    "content": [{"type": "input_text", "text": "Hi, need a quote"}],
                    "attachments": [{"name": "roof.jpg", "mime_type": "image/jpeg",
                                     "preview_url": "https://files.example.com/roof.jpg"}]
                },
                {
                    "id": "cthr_item_2",
                    "type": "chatkit.assistant_message",
                    "created_at": "2023-11-14T22:13:30Z",
                    "content": [{"type": "output_text", "text": "Happy to help"}]
                },
                {"id": "cthr_item_3", "type": "chatkit.widget", "created_at": 1_700_000_100}
            ],
            "has_more": false,
            "last_id": "cthr_item_3"
        });
        let resp: ItemListResponse = serde_json::from_value(body).unwrap();
        let page = ItemPage::from(resp);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor.as_deref(), Some("cthr_item_3"));

        match &page.items[0] {
            ConversationItem::CustomerMessage { text, attachments, created_at, .. } => {
                assert_eq!(text, "Hi, need a quote");
                assert_eq!(*created_at, 1_700_000_000);
                assert_eq!(attachments[0].url.as_deref(), Some("https://files.example.com/roof.jpg"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &page.items[1] {
            ConversationItem::AssistantMessage { created_at, .. } => {
                assert_eq!(*created_at, 1_700_000_010);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(page.items[2], ConversationItem::Other { .. }));
    }
}

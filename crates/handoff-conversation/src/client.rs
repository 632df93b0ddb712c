// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the hosted conversation API's thread item listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use handoff_config::model::ConversationConfig;
use handoff_core::types::{ItemPage, ThreadId};
use handoff_core::{AdapterType, ConversationApi, HandoffError, HealthStatus, PluginAdapter};
use handoff_security::build_api_client;

use crate::types::{ApiErrorResponse, ItemListResponse};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "chatkit_beta=v1";

/// Lists conversation items with bearer authentication.
///
/// Transient failures (429, 5xx) are retried once after a short pause.
#[derive(Debug, Clone)]
pub struct ChatKitClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

fn conversation_error(message: String, source: Option<reqwest::Error>) -> HandoffError {
    HandoffError::Conversation {
        message,
        source: source.map(|e| Box::new(e) as _),
    }
}

impl ChatKitClient {
    pub fn new(config: &ConversationConfig) -> Result<Self, HandoffError> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            HandoffError::Config("conversation.api_key is required".to_string())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                HandoffError::Config(format!("invalid conversation api key header value: {e}"))
            })?,
        );
        headers.insert(BETA_HEADER, HeaderValue::from_static(BETA_VALUE));

        let client = build_api_client(Duration::from_secs(config.request_timeout_secs), headers)?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Zero retry delay, for tests against a mock server.
    #[cfg(test)]
    fn without_retry_delay(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self
    }

    fn items_url(&self, thread_id: &ThreadId) -> String {
        format!("{}/chatkit/threads/{}/items", self.base_url, thread_id.as_str())
    }
}

#[async_trait]
impl PluginAdapter for ChatKitClient {
    fn name(&self) -> &str {
        "chatkit"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Conversation
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ConversationApi for ChatKitClient {
    async fn list_items(
        &self,
        thread_id: &ThreadId,
        after: Option<&str>,
        limit: u32,
    ) -> Result<ItemPage, HandoffError> {
        let mut url = url::Url::parse(&self.items_url(thread_id))
            .map_err(|e| HandoffError::Config(format!("invalid conversation.api_base: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("order", "asc");
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, thread_id = %thread_id, "retrying item listing");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = match self.client.get(url.clone()).send().await {
                Ok(r) => r,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    last_error = Some(conversation_error(format!("request failed: {e}"), Some(e)));
                    continue;
                }
                Err(e) => {
                    return Err(conversation_error(format!("request failed: {e}"), Some(e)));
                }
            };

            let status = response.status();
            debug!(status = %status, attempt, thread_id = %thread_id, "item listing response");

            if status.is_success() {
                let body: ItemListResponse = response.json().await.map_err(|e| {
                    conversation_error(format!("failed to parse item listing: {e}"), Some(e))
                })?;
                return Ok(body.into());
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient(status) && attempt < self.max_retries {
                last_error = Some(conversation_error(format!("api returned {status}"), None));
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api) => format!(
                    "api returned {status} ({}): {}",
                    api.error.kind.as_deref().unwrap_or("error"),
                    api.error.message
                ),
                Err(_) => format!("api returned {status}"),
            };
            return Err(conversation_error(message, None));
        }

        Err(last_error.unwrap_or_else(|| {
            conversation_error("item listing failed after retries".to_string(), None)
        }))
    }
}

fn is_transient(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatKitClient {
        let config = ConversationConfig {
            api_base: server.uri(),
            api_key: Some("sk-test-key".into()),
            ..ConversationConfig::default()
        };
        ChatKitClient::new(&config).unwrap().without_retry_delay()
    }

    fn thread() -> ThreadId {
        ThreadId::parse("cthr_abc", &["cthr_".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn sends_auth_and_paging_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chatkit/threads/cthr_abc/items"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(header("openai-beta", "chatkit_beta=v1"))
            .and(query_param("limit", "50"))
            .and(query_param("order", "asc"))
            .and(query_param("after", "item_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [], "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list_items(&thread(), Some("item_9"), 50)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": "i1", "type": "chatkit.user_message", "created_at": 5,
                          "content": [{"type": "input_text", "text": "hello"}]}],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let page = client_for(&server).list_items(&thread(), None, 100).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_a_conversation_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "No thread found"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .list_items(&thread(), None, 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), handoff_core::ErrorKind::Conversation);
        assert!(err.to_string().contains("No thread found"), "got: {err}");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = ChatKitClient::new(&ConversationConfig::default()).unwrap_err();
        assert_eq!(err.kind(), handoff_core::ErrorKind::Config);
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completions client that turns a transcript into a [`LeadSummary`].
//!
//! Transport failures are errors. A response that arrives but does not
//! carry a usable summary is [`SummaryOutcome::Malformed`], which callers
//! treat as "not ready".
//!
//! [`LeadSummary`]: handoff_core::types::LeadSummary

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use handoff_config::model::SummarizerConfig;
use handoff_core::types::{SummaryOutcome, TranscriptLine};
use handoff_core::{AdapterType, HandoffError, HealthStatus, PluginAdapter, Summarizer};
use handoff_security::build_api_client;

use crate::prompt::{SYSTEM_PROMPT, render_transcript, summary_schema, truncate_head_tail};
use crate::sanitize::{RawSummary, sanitize};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

fn summarizer_error(message: String, source: Option<reqwest::Error>) -> HandoffError {
    HandoffError::Summarizer {
        message,
        source: source.map(|e| Box::new(e) as _),
    }
}

/// Summarizer backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    url: String,
    model: String,
    max_transcript_chars: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, HandoffError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| HandoffError::Config("summarizer.api_key is required".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                HandoffError::Config(format!("invalid summarizer api key header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = build_api_client(Duration::from_secs(config.request_timeout_secs), headers)?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            max_transcript_chars: config.max_transcript_chars,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    #[cfg(test)]
    fn without_retry_delay(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self
    }

    fn build_request(&self, transcript: &[TranscriptLine]) -> CompletionRequest<'_> {
        let text = truncate_head_tail(&render_transcript(transcript), self.max_transcript_chars);
        CompletionRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Transcript:\n{text}"),
                },
            ],
            response_format: serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "lead_summary",
                    "strict": true,
                    "schema": summary_schema(),
                }
            }),
        }
    }

    async fn post(&self, request: &CompletionRequest<'_>) -> Result<String, HandoffError> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying summarizer request");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| summarizer_error(format!("request failed: {e}"), Some(e)))?;

            let status = response.status();
            debug!(status = %status, attempt, "summarizer response received");

            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| summarizer_error(format!("failed to read body: {e}"), Some(e)));
            }

            let transient = status.as_u16() == 429 || status.is_server_error();
            let err = summarizer_error(format!("api returned {status}"), None);
            if transient && attempt < self.max_retries {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }
        Err(last_error
            .unwrap_or_else(|| summarizer_error("request failed after retries".into(), None)))
    }
}

/// Interpret a successful response body.
fn interpret(body: &str) -> SummaryOutcome {
    let parsed: CompletionResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => return SummaryOutcome::Malformed(format!("unparseable response: {e}")),
    };
    let Some(choice) = parsed.choices.into_iter().next() else {
        return SummaryOutcome::Malformed("response has no choices".into());
    };
    if let Some(refusal) = choice.message.refusal {
        return SummaryOutcome::Malformed(format!("model refused: {refusal}"));
    }
    if choice.finish_reason.as_deref() == Some("length") {
        return SummaryOutcome::Malformed("response truncated".into());
    }
    let Some(content) = choice.message.content.filter(|c| !c.trim().is_empty()) else {
        return SummaryOutcome::Malformed("response has no content".into());
    };
    let raw: RawSummary = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => return SummaryOutcome::Malformed(format!("summary is not valid json: {e}")),
    };
    match sanitize(raw) {
        Ok(summary) => SummaryOutcome::Summary(summary),
        Err(rejection) => SummaryOutcome::Malformed(rejection.to_string()),
    }
}

#[async_trait]
impl PluginAdapter for OpenAiSummarizer {
    fn name(&self) -> &str {
        "openai-summarizer"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Summarizer
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        transcript: &[TranscriptLine],
    ) -> Result<SummaryOutcome, HandoffError> {
        let request = self.build_request(transcript);
        let body = self.post(&request).await?;
        let outcome = interpret(&body);
        match &outcome {
            SummaryOutcome::Summary(s) => info!(
                ready = s.handoff_ready,
                reason = %s.handoff_reason,
                "summarizer verdict"
            ),
            SummaryOutcome::Malformed(why) => warn!(reason = %why, "summarizer output rejected"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::types::{HandoffReason, Speaker};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summarizer(server: &MockServer) -> OpenAiSummarizer {
        let config = SummarizerConfig {
            api_base: server.uri(),
            api_key: Some("sk-sum-test".into()),
            ..SummarizerConfig::default()
        };
        OpenAiSummarizer::new(&config).unwrap().without_retry_delay()
    }

    fn transcript() -> Vec<TranscriptLine> {
        vec![TranscriptLine {
            timestamp: 1_700_000_000,
            speaker: Speaker::Customer,
            text: "Need my gutters cleaned, jane@example.com".into(),
        }]
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": content.to_string()},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn ready_summary_is_sanitized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-sum-test"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_schema", "json_schema": {"strict": true}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(serde_json::json!({
                "name": "Jane",
                "email": "jane@example.com",
                "phone": "not given",
                "handoff_ready": true,
                "handoff_reason": "contact_and_need_captured",
                "next_steps": ["Call Jane"],
                "missing_info": ["phone"]
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = summarizer(&server).summarize(&transcript()).await.unwrap();
        let SummaryOutcome::Summary(s) = outcome else {
            panic!("expected summary, got {outcome:?}");
        };
        assert!(s.handoff_ready);
        assert_eq!(s.handoff_reason, HandoffReason::ContactAndNeedCaptured);
        assert_eq!(s.email.as_deref(), Some("jane@example.com"));
        assert_eq!(s.phone, None);
        assert_eq!(s.missing_info, vec!["phone"]);
    }

    #[tokio::test]
    async fn non_json_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Sure! Here is the summary..."}}]
            })))
            .mount(&server)
            .await;

        let outcome = summarizer(&server).summarize(&transcript()).await.unwrap();
        assert!(matches!(outcome, SummaryOutcome::Malformed(_)));
    }

    #[tokio::test]
    async fn refusal_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": null, "refusal": "cannot help"}}]
            })))
            .mount(&server)
            .await;

        let outcome = summarizer(&server).summarize(&transcript()).await.unwrap();
        assert!(matches!(outcome, SummaryOutcome::Malformed(m) if m.contains("refused")));
    }

    #[tokio::test]
    async fn retries_then_fails_on_persistent_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let err = summarizer(&server).summarize(&transcript()).await.unwrap_err();
        assert_eq!(err.kind(), handoff_core::ErrorKind::Summarizer);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        assert!(summarizer(&server).summarize(&transcript()).await.is_err());
    }

    #[test]
    fn empty_choices_are_malformed() {
        assert!(matches!(
            interpret(r#"{"choices": []}"#),
            SummaryOutcome::Malformed(_)
        ));
    }
}

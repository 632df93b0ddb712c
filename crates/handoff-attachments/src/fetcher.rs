// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP attachment fetcher with a hard byte ceiling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use handoff_core::types::FetchedBody;
use handoff_core::{AdapterType, AttachmentFetcher, HandoffError, HealthStatus, PluginAdapter};
use handoff_security::{SsrfPolicy, build_fetch_client};

/// Downloads attachment bodies from the object store by URL.
///
/// URLs are screened with [`SsrfPolicy::check_url`] and the client resolves
/// hostnames through the SSRF-filtering resolver. Bodies are read chunk by
/// chunk and abandoned as soon as they pass the ceiling.
#[derive(Debug, Clone)]
pub struct HttpAttachmentFetcher {
    client: reqwest::Client,
    policy: SsrfPolicy,
    timeout: Duration,
}

impl HttpAttachmentFetcher {
    pub fn new(policy: SsrfPolicy, timeout: Duration) -> Result<Self, HandoffError> {
        let client = build_fetch_client(policy.clone(), timeout)?;
        Ok(Self {
            client,
            policy,
            timeout,
        })
    }

    fn fetch_error(&self, message: String, source: reqwest::Error) -> HandoffError {
        if source.is_timeout() {
            return HandoffError::Timeout {
                duration: self.timeout,
            };
        }
        HandoffError::Fetch {
            message,
            source: Some(Box::new(source)),
        }
    }
}

#[async_trait]
impl PluginAdapter for HttpAttachmentFetcher {
    fn name(&self) -> &str {
        "http-attachments"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AttachmentFetcher
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedBody, HandoffError> {
        let url = self.policy.check_url(url)?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.fetch_error(format!("request failed: {e}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandoffError::fetch(format!("object store returned {status}")));
        }

        if let Some(declared) = response.content_length() {
            if declared > max_bytes {
                return Err(HandoffError::TooLarge {
                    size: declared,
                    limit: max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.fetch_error(format!("failed to read body: {e}"), e))?
        {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(HandoffError::TooLarge {
                    size,
                    limit: max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(HandoffError::fetch("empty attachment body"));
        }
        debug!(bytes = bytes.len(), "attachment fetched");
        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }
}

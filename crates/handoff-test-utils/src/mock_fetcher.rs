// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock attachment fetcher backed by an in-memory URL map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use handoff_core::types::{AdapterType, FetchedBody, HealthStatus};
use handoff_core::{AttachmentFetcher, HandoffError, PluginAdapter};

#[derive(Default)]
pub struct MockAttachmentFetcher {
    bodies: HashMap<String, (Vec<u8>, Option<String>)>,
    calls: AtomicUsize,
}

impl MockAttachmentFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        self.bodies
            .insert(url.to_string(), (bytes, content_type.map(str::to_string)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockAttachmentFetcher {
    fn name(&self) -> &str {
        "mock-attachments"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AttachmentFetcher
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AttachmentFetcher for MockAttachmentFetcher {
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedBody, HandoffError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (bytes, content_type) = self
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| HandoffError::fetch(format!("no mock body for {url}")))?;
        if bytes.len() as u64 > max_bytes {
            return Err(HandoffError::TooLarge {
                size: bytes.len() as u64,
                limit: max_bytes,
            });
        }
        Ok(FetchedBody {
            bytes,
            content_type,
        })
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mail transport that records every accepted message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use handoff_core::types::{AdapterType, DeliveryReceipt, HealthStatus, MailEnvelope};
use handoff_core::{HandoffError, MailTransport, PluginAdapter};

/// A message captured by [`RecordingMailTransport`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub envelope: MailEnvelope,
    pub raw: Vec<u8>,
}

impl SentMail {
    /// The raw message as text (it is 7-bit by construction).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Captures outbound messages instead of delivering them.
pub struct RecordingMailTransport {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold every send for `delay` before accepting it.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().await = delay;
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for RecordingMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for RecordingMailTransport {
    fn name(&self) -> &str {
        "recording-mail"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MailTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send_raw(
        &self,
        envelope: &MailEnvelope,
        raw: &[u8],
    ) -> Result<DeliveryReceipt, HandoffError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(HandoffError::Transport {
                message: "mock transport rejected the message".to_string(),
                source: None,
            });
        }
        self.sent.lock().await.push(SentMail {
            envelope: envelope.clone(),
            raw: raw.to_vec(),
        });
        Ok(DeliveryReceipt {
            message_id: Some(format!("mock-{}", uuid::Uuid::new_v4().simple())),
        })
    }
}

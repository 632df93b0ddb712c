// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email transport adapter trait.

use async_trait::async_trait;

use crate::error::HandoffError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{DeliveryReceipt, MailEnvelope};

/// Accepts a fully assembled RFC 5322 message for delivery.
#[async_trait]
pub trait MailTransport: PluginAdapter {
    async fn send_raw(
        &self,
        envelope: &MailEnvelope,
        raw: &[u8],
    ) -> Result<DeliveryReceipt, HandoffError>;
}

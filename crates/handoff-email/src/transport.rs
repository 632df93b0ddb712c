// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery of pre-assembled raw messages.

use std::time::Duration;

use async_trait::async_trait;
use lettre::address::{Address, Envelope};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info};

use handoff_config::model::{MailConfig, SmtpTls};
use handoff_core::types::{DeliveryReceipt, MailEnvelope};
use handoff_core::{AdapterType, HandoffError, HealthStatus, MailTransport, PluginAdapter};

fn transport_error(message: String, source: Option<lettre::transport::smtp::Error>) -> HandoffError {
    HandoffError::Transport {
        message,
        source: source.map(|e| Box::new(e) as _),
    }
}

/// Sends raw messages through an SMTP relay.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailTransport {
    pub fn new(config: &MailConfig) -> Result<Self, HandoffError> {
        let builder = match config.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| HandoffError::Config(format!("invalid smtp relay: {e}")))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| HandoffError::Config(format!("invalid smtp relay: {e}")))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host),
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.send_timeout_secs)));
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.smtp_host.clone(),
        })
    }
}

/// Convert the pipeline's envelope into lettre's, parsing `Name <addr>` forms.
pub fn to_envelope(envelope: &MailEnvelope) -> Result<Envelope, HandoffError> {
    let from = parse_address(&envelope.from)?;
    let to = envelope
        .to
        .iter()
        .map(|t| parse_address(t))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to)
        .map_err(|e| HandoffError::Config(format!("invalid mail envelope: {e}")))
}

fn parse_address(raw: &str) -> Result<Address, HandoffError> {
    if let Ok(mailbox) = raw.parse::<Mailbox>() {
        return Ok(mailbox.email);
    }
    raw.trim()
        .parse::<Address>()
        .map_err(|e| HandoffError::Config(format!("invalid mail address `{raw}`: {e}")))
}

#[async_trait]
impl PluginAdapter for SmtpMailTransport {
    fn name(&self) -> &str {
        "smtp"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MailTransport
    }

    async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded(format!(
                "smtp relay {} did not accept a NOOP",
                self.host
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "smtp relay {} unreachable: {e}",
                self.host
            ))),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send_raw(
        &self,
        envelope: &MailEnvelope,
        raw: &[u8],
    ) -> Result<DeliveryReceipt, HandoffError> {
        let smtp_envelope = to_envelope(envelope)?;
        debug!(bytes = raw.len(), recipients = envelope.to.len(), "sending raw message");

        let response = self
            .transport
            .send_raw(&smtp_envelope, raw)
            .await
            .map_err(|e| transport_error(format!("smtp send failed: {e}"), Some(e)))?;

        let message_id = response.message().next().map(|line| line.trim().to_string());
        info!(code = %response.code(), "smtp relay accepted message");
        Ok(DeliveryReceipt { message_id })
    }
}

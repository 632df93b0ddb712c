// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead notification email: body composition, MIME assembly, SMTP delivery.

pub mod mime;
pub mod render;
pub mod sections;
pub mod transport;

use chrono::{DateTime, Utc};

use handoff_config::model::MailConfig;
use handoff_core::types::MailEnvelope;

pub use mime::{Boundaries, OutgoingMessage, assemble};
pub use render::{render_html, render_text};
pub use sections::{BodySection, LeadNotification, compose, subject};
pub use transport::SmtpMailTransport;

/// A message ready for the transport.
#[derive(Debug, Clone)]
pub struct RenderedNotification {
    pub subject: String,
    pub message_id: String,
    pub envelope: MailEnvelope,
    pub raw: Vec<u8>,
}

/// Turns a [`LeadNotification`] into raw message bytes for the configured
/// sender and recipients.
#[derive(Debug, Clone)]
pub struct MessageAssembler {
    from: String,
    to: Vec<String>,
    subject_prefix: String,
}

impl MessageAssembler {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: config.from.clone(),
            to: config.to.clone(),
            subject_prefix: config.subject_prefix.clone(),
        }
    }

    /// Render and assemble with fresh boundaries and message id.
    pub fn build(&self, lead: &LeadNotification<'_>, date: DateTime<Utc>) -> RenderedNotification {
        self.build_with(lead, date, &Boundaries::generate(), &mime::new_message_id(&self.from))
    }

    /// Render and assemble with the given boundaries and message id.
    pub fn build_with(
        &self,
        lead: &LeadNotification<'_>,
        date: DateTime<Utc>,
        boundaries: &Boundaries,
        message_id: &str,
    ) -> RenderedNotification {
        let sections = compose(lead);
        let text = render_text(&sections);
        let html = render_html(&sections);
        let subject = subject(&self.subject_prefix, lead);

        let raw = assemble(
            &OutgoingMessage {
                from: &self.from,
                to: &self.to,
                reply_to: lead.best_email(),
                subject: &subject,
                date,
                message_id,
                text: &text,
                html: &html,
                inline: lead.inline,
            },
            boundaries,
        );

        RenderedNotification {
            subject,
            message_id: message_id.to_string(),
            envelope: MailEnvelope {
                from: mime::mailbox_address(&self.from).to_string(),
                to: self
                    .to
                    .iter()
                    .map(|t| mime::mailbox_address(t).to_string())
                    .collect(),
            },
            raw,
        }
    }
}

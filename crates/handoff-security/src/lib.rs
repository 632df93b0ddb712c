// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound network safety for the handoff service.
//!
//! SSRF filtering for user-supplied attachment URLs, TLS-enforcing client
//! builders, and secret redaction for persisted error text.

pub mod redact;
pub mod ssrf;
pub mod tls;

use handoff_config::HandoffConfig;

pub use redact::Redactor;
pub use ssrf::{SsrfPolicy, SsrfSafeResolver, is_private_ip};
pub use tls::{build_api_client, build_fetch_client};

/// Redactor seeded with every credential present in the configuration.
pub fn redactor_for(config: &HandoffConfig) -> Redactor {
    Redactor::new(
        [
            config.conversation.api_key.as_deref(),
            config.summarizer.api_key.as_deref(),
            config.mail.smtp_password.as_deref(),
            config.server.retry_token.as_deref(),
        ]
        .into_iter()
        .flatten(),
    )
}

/// SSRF policy from the `[security]` section.
pub fn ssrf_policy_for(config: &HandoffConfig) -> SsrfPolicy {
    SsrfPolicy::new(&config.security.allowed_private_ips)
}

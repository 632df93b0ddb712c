// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! Every rule runs; failures are collected rather than returned on the first hit.

use crate::diagnostic::ConfigError;
use crate::model::HandoffConfig;

/// Shortest lease accepted.
const MIN_LEASE_SECS: u64 = 60;

/// Upper bound on `conversation.page_size` imposed by the conversation API.
const MAX_PAGE_SIZE: u32 = 100;

/// Validate a deserialized configuration.
pub fn validate_config(config: &HandoffConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }
    if config.storage.record_retention_days == 0 {
        errors.push(ConfigError::invalid(
            "storage.record_retention_days",
            "must be at least 1",
        ));
    }

    validate_conversation(config, &mut errors);
    validate_pipeline(config, &mut errors);
    validate_attachments(config, &mut errors);

    if config.summarizer.enabled {
        check_api_base("summarizer.api_base", &config.summarizer.api_base, &mut errors);
        if config.summarizer.model.trim().is_empty() {
            errors.push(ConfigError::invalid("summarizer.model", "must not be empty"));
        }
    }

    if config.mail.enabled {
        validate_mail(config, &mut errors);
    }

    for (i, ip) in config.security.allowed_private_ips.iter().enumerate() {
        if ip.parse::<std::net::IpAddr>().is_err() {
            errors.push(ConfigError::invalid(
                &format!("security.allowed_private_ips[{i}]"),
                format!("`{ip}` is not an IP address"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &HandoffConfig, errors: &mut Vec<ConfigError>) {
    let host = config.server.host.trim();
    let is_ip = host.parse::<std::net::IpAddr>().is_ok();
    let is_hostname = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !is_ip && !is_hostname {
        errors.push(ConfigError::invalid(
            "server.host",
            format!("`{host}` is not a valid IP address or hostname"),
        ));
    }
    if config.server.port == 0 {
        errors.push(ConfigError::invalid("server.port", "must not be 0"));
    }
    if config.server.max_body_bytes < 1024 {
        errors.push(ConfigError::invalid(
            "server.max_body_bytes",
            "must be at least 1024",
        ));
    }
    if let Some(token) = &config.server.retry_token {
        if token.trim().len() < 16 {
            errors.push(ConfigError::invalid(
                "server.retry_token",
                "must be at least 16 characters when set",
            ));
        }
    }
}

fn validate_conversation(config: &HandoffConfig, errors: &mut Vec<ConfigError>) {
    let conv = &config.conversation;
    check_api_base("conversation.api_base", &conv.api_base, errors);
    if conv.page_size == 0 || conv.page_size > MAX_PAGE_SIZE {
        errors.push(ConfigError::invalid(
            "conversation.page_size",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", conv.page_size),
        ));
    }
    if conv.max_pages == 0 {
        errors.push(ConfigError::invalid("conversation.max_pages", "must be at least 1"));
    }
    if conv.thread_id_prefixes.is_empty() {
        errors.push(ConfigError::invalid(
            "conversation.thread_id_prefixes",
            "must list at least one prefix",
        ));
    }
    if conv.thread_id_prefixes.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigError::invalid(
            "conversation.thread_id_prefixes",
            "must not contain empty prefixes",
        ));
    }
}

fn validate_pipeline(config: &HandoffConfig, errors: &mut Vec<ConfigError>) {
    let pipeline = &config.pipeline;
    if pipeline.lease_secs < MIN_LEASE_SECS {
        errors.push(ConfigError::invalid(
            "pipeline.lease_secs",
            format!("must be at least {MIN_LEASE_SECS}, got {}", pipeline.lease_secs),
        ));
    }

    // A lease that can expire mid-pipeline lets a second invocation send too.
    let worst_case = config.conversation.request_timeout_secs
        + config.summarizer.request_timeout_secs
        + config.attachments.fetch_timeout_secs
        + config.mail.send_timeout_secs;
    if pipeline.lease_secs <= worst_case {
        errors.push(ConfigError::invalid(
            "pipeline.lease_secs",
            format!(
                "must exceed the sum of per-call timeouts ({worst_case}s), got {}",
                pipeline.lease_secs
            ),
        ));
    }

    if pipeline.cooldown_secs == 0 {
        errors.push(ConfigError::invalid("pipeline.cooldown_secs", "must be greater than 0"));
    }
    if pipeline.idle_threshold_secs == 0 {
        errors.push(ConfigError::invalid(
            "pipeline.idle_threshold_secs",
            "must be greater than 0",
        ));
    }
    if pipeline.retry_poll_interval_secs == 0 {
        errors.push(ConfigError::invalid(
            "pipeline.retry_poll_interval_secs",
            "must be greater than 0",
        ));
    }
    if pipeline.purge_interval_secs == 0 {
        errors.push(ConfigError::invalid(
            "pipeline.purge_interval_secs",
            "must be greater than 0",
        ));
    }
}

fn validate_attachments(config: &HandoffConfig, errors: &mut Vec<ConfigError>) {
    let att = &config.attachments;
    if att.max_inline_bytes == 0 {
        errors.push(ConfigError::invalid(
            "attachments.max_inline_bytes",
            "must be greater than 0",
        ));
    }
    if att.max_total_inline_bytes < att.max_inline_bytes {
        errors.push(ConfigError::invalid(
            "attachments.max_total_inline_bytes",
            format!(
                "must be at least attachments.max_inline_bytes ({})",
                att.max_inline_bytes
            ),
        ));
    }
    if att.fetch_concurrency == 0 {
        errors.push(ConfigError::invalid(
            "attachments.fetch_concurrency",
            "must be at least 1",
        ));
    }
}

fn validate_mail(config: &HandoffConfig, errors: &mut Vec<ConfigError>) {
    let mail = &config.mail;
    if mail.smtp_host.trim().is_empty() {
        errors.push(ConfigError::invalid("mail.smtp_host", "must not be empty"));
    }
    if !looks_like_mailbox(&mail.from) {
        errors.push(ConfigError::invalid(
            "mail.from",
            format!("`{}` is not a mailbox address", mail.from),
        ));
    }
    if mail.to.is_empty() {
        errors.push(ConfigError::invalid(
            "mail.to",
            "must list at least one recipient when mail is enabled",
        ));
    }
    for (i, to) in mail.to.iter().enumerate() {
        if !looks_like_mailbox(to) {
            errors.push(ConfigError::invalid(
                &format!("mail.to[{i}]"),
                format!("`{to}` is not a mailbox address"),
            ));
        }
    }
    if mail.smtp_username.is_some() != mail.smtp_password.is_some() {
        errors.push(ConfigError::invalid(
            "mail.smtp_password",
            "smtp_username and smtp_password must be set together",
        ));
    }
}

/// Accepts `addr@host` or `Display Name <addr@host>`.
fn looks_like_mailbox(value: &str) -> bool {
    let value = value.trim();
    let addr = match (value.rfind('<'), value.ends_with('>')) {
        (Some(open), true) => &value[open + 1..value.len() - 1],
        (None, false) => value,
        _ => return false,
    };
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !addr.chars().any(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    }
}

/// Remote API bases must use HTTPS; loopback hosts may use plain HTTP.
fn check_api_base(field: &str, value: &str, errors: &mut Vec<ConfigError>) {
    let parsed = match url::Url::parse(value) {
        Ok(u) => u,
        Err(e) => {
            errors.push(ConfigError::invalid(field, format!("`{value}` is not a URL: {e}")));
            return;
        }
    };
    let loopback = matches!(
        parsed.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    );
    match parsed.scheme() {
        "https" => {}
        "http" if loopback => {}
        scheme => errors.push(ConfigError::invalid(
            field,
            format!("must use https (got `{scheme}`); plain http is allowed only for localhost"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], field: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { field: f, .. } if f == field))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&HandoffConfig::default()).is_ok());
    }

    #[test]
    fn short_lease_is_rejected() {
        let mut config = HandoffConfig::default();
        config.pipeline.lease_secs = 30;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "pipeline.lease_secs"));
    }

    #[test]
    fn lease_must_cover_call_timeouts() {
        let mut config = HandoffConfig::default();
        config.pipeline.lease_secs = 120;
        config.summarizer.request_timeout_secs = 100;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("per-call timeouts")));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = HandoffConfig::default();
        config.server.port = 0;
        config.pipeline.cooldown_secs = 0;
        config.conversation.page_size = 500;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "server.port"));
        assert!(has_error(&errors, "pipeline.cooldown_secs"));
        assert!(has_error(&errors, "conversation.page_size"));
    }

    #[test]
    fn plain_http_only_for_loopback() {
        let mut config = HandoffConfig::default();
        config.conversation.api_base = "http://127.0.0.1:9000".into();
        assert!(validate_config(&config).is_ok());

        config.conversation.api_base = "http://api.example.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "conversation.api_base"));
    }

    #[test]
    fn enabled_mail_requires_recipients() {
        let mut config = HandoffConfig::default();
        config.mail.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "mail.to"));

        config.mail.to = vec!["Sales <sales@example.com>".into()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn mailbox_shapes() {
        assert!(looks_like_mailbox("a@b.co"));
        assert!(looks_like_mailbox("Leads Desk <leads@example.com>"));
        assert!(!looks_like_mailbox("not-an-address"));
        assert!(!looks_like_mailbox("Broken <a@b.co"));
        assert!(!looks_like_mailbox("a b@c.d"));
    }

    #[test]
    fn inline_total_must_cover_single_ceiling() {
        let mut config = HandoffConfig::default();
        config.attachments.max_total_inline_bytes = 1024;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "attachments.max_total_inline_bytes"));
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for handoff configuration loading.

use handoff_config::diagnostic::ConfigError;
use handoff_config::model::{HandoffConfig, SmtpTls};
use handoff_config::{load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
name = "acme-handoff"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9000
retry_token = "0123456789abcdef0123"

[storage]
database_path = "/tmp/handoff-test.db"
wal_mode = false
record_retention_days = 7

[conversation]
api_key = "sk-conv"
page_size = 50
thread_id_prefixes = ["cthr_"]

[summarizer]
api_key = "sk-sum"
model = "gpt-4.1"

[mail]
enabled = true
smtp_host = "smtp.example.com"
smtp_port = 465
tls = "tls"
from = "Leads <leads@example.com>"
to = ["owner@example.com", "Desk <desk@example.com>"]
business_phones = ["(555) 010-2000"]

[attachments]
inline_enabled = false

[pipeline]
idle_threshold_secs = 600
cooldown_secs = 120

[security]
allowed_private_ips = ["10.0.0.5"]
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.service.name, "acme-handoff");
    assert_eq!(config.server.port, 9000);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.record_retention_days, 7);
    assert_eq!(config.conversation.page_size, 50);
    assert_eq!(config.conversation.thread_id_prefixes, vec!["cthr_"]);
    assert_eq!(config.summarizer.model, "gpt-4.1");
    assert_eq!(config.mail.tls, SmtpTls::Tls);
    assert_eq!(config.mail.to.len(), 2);
    assert!(!config.attachments.inline_enabled);
    assert_eq!(config.pipeline.idle_threshold_secs, 600);
    assert_eq!(config.pipeline.lease_secs, 300);
    assert_eq!(config.security.allowed_private_ips, vec!["10.0.0.5"]);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.pipeline.idle_threshold_secs, 300);
    assert_eq!(config.pipeline.retry_margin_secs, 20);
    assert_eq!(config.pipeline.cooldown_secs, 90);
    assert_eq!(config.conversation.page_size, 100);
    assert_eq!(config.conversation.max_pages, 20);
    assert_eq!(config.attachments.max_inline_bytes, 5 * 1024 * 1024);
    assert_eq!(config.attachments.max_total_inline_bytes, 8 * 1024 * 1024);
    assert_eq!(config.conversation.thread_id_prefixes, vec!["conv_", "cthr_"]);
    assert!(!config.mail.enabled);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[pipeline]\nlease_sec = 400\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "lease_sec" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("lease_secs"));
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n").expect_err("reject");
    assert!(err.to_string().contains("telemetry"), "got: {err}");
}

#[test]
fn bad_tls_variant_is_reported_as_invalid_value() {
    let errors = load_and_validate_str("[mail]\ntls = \"ssl\"\n").expect_err("reject");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("tls"))),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_loader() {
    let errors =
        load_and_validate_str("[pipeline]\nlease_secs = 10\n").expect_err("lease too short");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { field, .. } if field == "pipeline.lease_secs"))
    );
}

#[test]
fn figment_tuple_overrides_apply() {
    use figment::Figment;
    use figment::providers::Serialized;

    let config: HandoffConfig = Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(("mail.smtp_host", "relay.internal"))
        .merge(("pipeline.retry_margin_secs", 45))
        .extract()
        .expect("extract");
    assert_eq!(config.mail.smtp_host, "relay.internal");
    assert_eq!(config.pipeline.retry_margin_secs, 45);
}

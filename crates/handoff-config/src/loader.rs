// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/handoff/handoff.toml`
//! 3. `~/.config/handoff/handoff.toml`
//! 4. `./handoff.toml`
//! 5. `HANDOFF_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::model::HandoffConfig;

/// Top-level sections addressable from the environment.
const SECTIONS: &[&str] = &[
    "service",
    "server",
    "storage",
    "conversation",
    "summarizer",
    "mail",
    "attachments",
    "pipeline",
    "security",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/handoff/handoff.toml";
pub(crate) const LOCAL_CONFIG: &str = "handoff.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("handoff").join("handoff.toml"))
        .unwrap_or_default()
}

/// Files from the standard hierarchy that exist, lowest priority first.
/// Paths are absolute, matching what figment reports in its errors.
pub fn existing_layers() -> Vec<PathBuf> {
    let local = std::env::current_dir()
        .map(|d| d.join(LOCAL_CONFIG))
        .unwrap_or_else(|_| LOCAL_CONFIG.into());
    [PathBuf::from(SYSTEM_CONFIG), user_config_path(), local]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}

/// Build the full layered Figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<HandoffConfig, figment::Error> {
    debug!(files = ?existing_layers(), "merging config defaults, files and HANDOFF_* env");
    build_figment().extract()
}

/// Load configuration from a TOML string over the defaults. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<HandoffConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HandoffConfig, figment::Error> {
    debug!(file = %path.display(), "merging config defaults, file and HANDOFF_* env");
    Figment::new()
        .merge(Serialized::defaults(HandoffConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `HANDOFF_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after the prefix separates section from key, so
/// `HANDOFF_MAIL_SMTP_HOST` becomes `mail.smtp_host`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("HANDOFF_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    match key.split_once('_') {
        Some((section, rest)) if SECTIONS.contains(&section) => format!("{section}.{rest}"),
        _ => key.to_string(),
    }
}

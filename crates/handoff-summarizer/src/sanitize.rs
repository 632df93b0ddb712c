// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plausibility filtering of model output.
//!
//! Every field is checked on its own; a field that fails is nulled (or
//! dropped from its list) while the rest of the summary is kept.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use handoff_core::types::{HandoffReason, LeadSummary};

const MAX_FIELD_CHARS: usize = 300;
const MAX_SUMMARY_CHARS: usize = 1200;
const MAX_LIST_ITEMS: usize = 6;
const MAX_LIST_ITEM_CHARS: usize = 240;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("static regex")
});

/// Model output before any checks. Everything optional so a partial object
/// still deserializes and can be judged field by field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSummary {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub service: Option<String>,
    pub timeline: Option<String>,
    pub budget: Option<String>,
    pub preferred_contact: Option<String>,
    pub summary: Option<String>,
    pub handoff_ready: Option<bool>,
    pub handoff_reason: Option<HandoffReason>,
    pub next_steps: Option<Vec<String>>,
    pub follow_up_questions: Option<Vec<String>>,
    pub call_script: Option<Vec<String>>,
    pub missing_info: Option<Vec<String>>,
}

/// Reasons a raw summary is rejected outright.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingReadiness,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::MissingReadiness => f.write_str("handoff_ready missing from summary"),
        }
    }
}

/// Apply all field checks. Without an explicit readiness flag the summary is
/// rejected, since defaulting it either way would be a guess.
pub fn sanitize(raw: RawSummary) -> Result<LeadSummary, Rejection> {
    let handoff_ready = raw.handoff_ready.ok_or(Rejection::MissingReadiness)?;
    Ok(LeadSummary {
        name: text_field(raw.name, MAX_FIELD_CHARS),
        email: raw.email.and_then(|e| plausible_email(&e)),
        phone: raw.phone.and_then(|p| plausible_phone(&p)),
        company: text_field(raw.company, MAX_FIELD_CHARS),
        location: text_field(raw.location, MAX_FIELD_CHARS),
        service: text_field(raw.service, MAX_FIELD_CHARS),
        timeline: text_field(raw.timeline, MAX_FIELD_CHARS),
        budget: text_field(raw.budget, MAX_FIELD_CHARS),
        preferred_contact: text_field(raw.preferred_contact, MAX_FIELD_CHARS),
        summary: text_field(raw.summary, MAX_SUMMARY_CHARS),
        handoff_ready,
        handoff_reason: raw.handoff_reason.unwrap_or(HandoffReason::Unknown),
        next_steps: list_field(raw.next_steps),
        follow_up_questions: list_field(raw.follow_up_questions),
        call_script: list_field(raw.call_script),
        missing_info: list_field(raw.missing_info),
    })
}

fn text_field(value: Option<String>, max_chars: usize) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed == "N/A" {
        return None;
    }
    Some(clip(trimmed, max_chars))
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars - 1).collect();
        out.push('…');
        out
    }
}

fn list_field(values: Option<Vec<String>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| text_field(Some(v), MAX_LIST_ITEM_CHARS))
        .take(MAX_LIST_ITEMS)
        .collect()
}

/// The address if it matches the email shape, lowercased domain.
pub fn plausible_email(raw: &str) -> Option<String> {
    let candidate = raw.trim().trim_matches(|c| c == '<' || c == '>');
    if candidate.len() > 254 || !EMAIL.is_match(candidate) {
        return None;
    }
    let (local, domain) = candidate.rsplit_once('@')?;
    Some(format!("{local}@{}", domain.to_ascii_lowercase()))
}

/// The number as written if it has 7 to 15 digits and only phone punctuation.
pub fn plausible_phone(raw: &str) -> Option<String> {
    let candidate = raw.trim();
    let allowed = candidate
        .chars()
        .all(|c| c.is_ascii_digit() || " +-().".contains(c) || c == 'x');
    let digits = candidate.chars().filter(char::is_ascii_digit).count();
    if allowed && (7..=15).contains(&digits) {
        Some(candidate.to_string())
    } else {
        None
    }
}

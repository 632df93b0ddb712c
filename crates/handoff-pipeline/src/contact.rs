// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact extraction from customer-authored transcript lines.
//!
//! Attachment marker rows and URLs are ignored so that object keys and
//! query strings are never mistaken for phone numbers. When the customer
//! gives more than one address or number, the most recent one wins.

use std::sync::LazyLock;

use regex::Regex;

use handoff_core::types::{ATTACHMENT_MARKER, ContactInfo, Speaker, TranscriptLine};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}")
        .expect("static regex")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.\-]?)?(?:\(\d{2,4}\)|\d{2,4})(?:[\s.\-]?\d{2,4}){1,4}")
        .expect("static regex")
});

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?|ftp)://\S+").expect("static regex"));

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"));

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;
/// Numbers are compared on their national part so that `+1` prefixes match.
const NATIONAL_DIGITS: usize = 10;

/// Finds customer email addresses and phone numbers.
#[derive(Debug, Clone, Default)]
pub struct ContactExtractor {
    business_phones: Vec<String>,
}

impl ContactExtractor {
    /// `business_phones` are the business's own numbers, which customers
    /// often repeat back and which must not count as their contact.
    pub fn new(business_phones: &[String]) -> Self {
        Self {
            business_phones: business_phones
                .iter()
                .map(|p| digits(p))
                .filter(|d| d.len() >= MIN_PHONE_DIGITS)
                .collect(),
        }
    }

    pub fn extract(&self, lines: &[TranscriptLine]) -> ContactInfo {
        let mut found = ContactInfo::default();
        for line in lines.iter().filter(|l| l.speaker == Speaker::Customer) {
            for row in line.text.lines() {
                if row.trim_start().starts_with(ATTACHMENT_MARKER) {
                    continue;
                }
                let row = URL.replace_all(row, " ");
                if let Some(email) = EMAIL.find_iter(&row).last() {
                    found.email = Some(email.as_str().trim_end_matches('.').to_string());
                }
                if let Some(phone) = PHONE
                    .find_iter(&row)
                    .map(|m| m.as_str().trim())
                    .filter(|p| self.is_customer_phone(p))
                    .last()
                {
                    found.phone = Some(phone.to_string());
                }
            }
        }
        found
    }

    fn is_customer_phone(&self, candidate: &str) -> bool {
        if ISO_DATE.is_match(candidate) {
            return false;
        }
        let d = digits(candidate);
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&d.len()) {
            return false;
        }
        !self.business_phones.iter().any(|b| same_number(b, &d))
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn same_number(a: &str, b: &str) -> bool {
    let tail = |s: &str| s[s.len().saturating_sub(NATIONAL_DIGITS)..].to_string();
    tail(a) == tail(b)
}

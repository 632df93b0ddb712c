// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notification body as an ordered list of typed sections.
//!
//! [`compose`] decides what goes into the email and in which order; the
//! renderers in [`crate::render`] only decide how each section looks.

use handoff_core::types::{
    AttachmentRef, AttributionEntry, ContactInfo, InlineAttachment, LeadSummary, Speaker,
    TranscriptLine,
};

/// One block of the notification body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySection {
    Heading(String),
    /// Label/value rows. Rows with empty values are never emitted.
    Fields(Vec<(String, String)>),
    Paragraph(String),
    Bullets { title: String, items: Vec<String> },
    Transcript {
        assistant_name: String,
        lines: Vec<TranscriptLine>,
    },
    Attachments(Vec<AttachmentItem>),
}

/// An attachment as shown in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentItem {
    pub name: String,
    pub url: String,
    pub mime_type: Option<String>,
    /// Set when the bytes are embedded in the message.
    pub content_id: Option<String>,
}

/// Inputs to a lead notification.
#[derive(Debug, Clone, Copy)]
pub struct LeadNotification<'a> {
    pub thread_id: &'a str,
    pub assistant_name: &'a str,
    pub transcript: &'a [TranscriptLine],
    pub contact: &'a ContactInfo,
    pub summary: &'a LeadSummary,
    pub attachments: &'a [AttachmentRef],
    pub inline: &'a [InlineAttachment],
    pub attribution: Option<&'a AttributionEntry>,
}

impl LeadNotification<'_> {
    /// Summary email when it passed the plausibility check, else the transcript's.
    pub fn best_email(&self) -> Option<&str> {
        self.summary
            .email
            .as_deref()
            .or(self.contact.email.as_deref())
    }

    pub fn best_phone(&self) -> Option<&str> {
        self.summary
            .phone
            .as_deref()
            .or(self.contact.phone.as_deref())
    }
}

/// `<prefix> <name or email or phone> (<thread id>)`.
pub fn subject(prefix: &str, lead: &LeadNotification<'_>) -> String {
    let who = lead
        .summary
        .name
        .as_deref()
        .or_else(|| lead.best_email())
        .or_else(|| lead.best_phone())
        .unwrap_or("website visitor");
    format!("{} {who} ({})", prefix.trim(), lead.thread_id)
}

/// Lay out the notification.
pub fn compose(lead: &LeadNotification<'_>) -> Vec<BodySection> {
    let s = lead.summary;
    let mut sections = vec![BodySection::Heading("New chat lead".into())];

    sections.push(BodySection::Fields(present(vec![
        ("Name", s.name.as_deref()),
        ("Email", lead.best_email()),
        ("Phone", lead.best_phone()),
        ("Company", s.company.as_deref()),
        ("Location", s.location.as_deref()),
        ("Service", s.service.as_deref()),
        ("Timeline", s.timeline.as_deref()),
        ("Budget", s.budget.as_deref()),
        ("Preferred contact", s.preferred_contact.as_deref()),
    ])));

    if let Some(text) = &s.summary {
        sections.push(BodySection::Heading("Summary".into()));
        sections.push(BodySection::Paragraph(text.clone()));
    }

    for (title, items) in [
        ("Next steps", &s.next_steps),
        ("Follow-up questions", &s.follow_up_questions),
        ("Call script", &s.call_script),
        ("Still missing", &s.missing_info),
    ] {
        if !items.is_empty() {
            sections.push(BodySection::Bullets {
                title: title.into(),
                items: items.clone(),
            });
        }
    }

    if !lead.attachments.is_empty() {
        sections.push(BodySection::Heading("Attachments".into()));
        sections.push(BodySection::Attachments(attachment_items(lead)));
    }

    sections.push(BodySection::Heading("Transcript".into()));
    sections.push(BodySection::Transcript {
        assistant_name: lead.assistant_name.to_string(),
        lines: lead.transcript.to_vec(),
    });

    sections.push(BodySection::Heading("Source".into()));
    sections.push(BodySection::Fields(source_fields(lead)));
    sections
}

fn present(rows: Vec<(&str, Option<&str>)>) -> Vec<(String, String)> {
    rows.into_iter()
        .filter_map(|(label, value)| {
            let value = value?.trim();
            (!value.is_empty()).then(|| (label.to_string(), value.to_string()))
        })
        .collect()
}

fn attachment_items(lead: &LeadNotification<'_>) -> Vec<AttachmentItem> {
    lead.attachments
        .iter()
        .map(|r| AttachmentItem {
            name: r.display_name.clone(),
            url: r.url.clone(),
            mime_type: r.mime_type.clone(),
            content_id: lead
                .inline
                .iter()
                .find(|i| i.source_url == r.url)
                .map(|i| i.content_id.clone()),
        })
        .collect()
}

fn source_fields(lead: &LeadNotification<'_>) -> Vec<(String, String)> {
    let mut rows = vec![("Conversation".to_string(), lead.thread_id.to_string())];
    let Some(entry) = lead.attribution else {
        return rows;
    };
    let recorded = chrono::DateTime::from_timestamp(entry.recorded_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string());
    rows.extend(present(vec![
        ("Page", entry.page_url.as_deref()),
        ("Locale", entry.locale.as_deref()),
        ("First seen", recorded.as_deref()),
    ]));
    if let Some(serde_json::Value::Object(map)) = &entry.attribution {
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            if !value.trim().is_empty() {
                rows.push((key.clone(), value));
            }
        }
    }
    rows
}

/// Speaker label for a transcript line.
pub fn speaker_label<'a>(speaker: Speaker, assistant_name: &'a str) -> &'a str {
    match speaker {
        Speaker::Customer => "Customer",
        Speaker::Assistant => assistant_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_core::types::{HandoffReason, TriggerReason};

    fn summary() -> LeadSummary {
        LeadSummary {
            name: Some("Jane Doe".into()),
            summary: Some("Wants gutters cleaned.".into()),
            next_steps: vec!["Call back".into()],
            ..LeadSummary::not_ready(HandoffReason::ContactAndNeedCaptured)
        }
    }

    fn lead<'a>(
        summary: &'a LeadSummary,
        contact: &'a ContactInfo,
        attribution: Option<&'a AttributionEntry>,
    ) -> LeadNotification<'a> {
        LeadNotification {
            thread_id: "conv_abc",
            assistant_name: "Ava",
            transcript: &[],
            contact,
            summary,
            attachments: &[],
            inline: &[],
            attribution,
        }
    }

    #[test]
    fn subject_prefers_name_then_contact() {
        let contact = ContactInfo {
            email: Some("jane@example.com".into()),
            phone: None,
        };
        let s = summary();
        assert_eq!(
            subject("New chat lead:", &lead(&s, &contact, None)),
            "New chat lead: Jane Doe (conv_abc)"
        );
        let anonymous = LeadSummary::not_ready(HandoffReason::Unknown);
        assert_eq!(
            subject("Lead:", &lead(&anonymous, &contact, None)),
            "Lead: jane@example.com (conv_abc)"
        );
    }

    #[test]
    fn empty_fields_and_lists_are_omitted() {
        let contact = ContactInfo::default();
        let s = summary();
        let sections = compose(&lead(&s, &contact, None));
        let BodySection::Fields(rows) = &sections[1] else {
            panic!("expected fields");
        };
        assert_eq!(rows, &vec![("Name".to_string(), "Jane Doe".to_string())]);
        let bullet_titles: Vec<_> = sections
            .iter()
            .filter_map(|s| match s {
                BodySection::Bullets { title, .. } => Some(title.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(bullet_titles, vec!["Next steps"]);
        assert!(!sections.iter().any(|s| matches!(s, BodySection::Attachments(_))));
    }

    #[test]
    fn attribution_is_rendered_into_source() {
        let contact = ContactInfo::default();
        let s = summary();
        let entry = AttributionEntry {
            thread_id: "conv_abc".into(),
            page_url: Some("https://site.example/pricing".into()),
            locale: Some("en-US".into()),
            reason: TriggerReason::Idle,
            attribution: Some(serde_json::json!({"utm_source": "google", "gclid": null})),
            recorded_at: 1_700_000_000,
        };
        let sections = compose(&lead(&s, &contact, Some(&entry)));
        let BodySection::Fields(rows) = sections.last().unwrap() else {
            panic!("expected source fields");
        };
        let labels: Vec<_> = rows.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Conversation", "Page", "Locale", "First seen", "utm_source"]
        );
    }
}

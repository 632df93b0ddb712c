// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript rendering for the model and the strict output schema.

use handoff_core::types::{Speaker, TranscriptLine};
use serde_json::{Value, json};

pub const SYSTEM_PROMPT: &str = "\
You review website chat transcripts between a service business's assistant and a \
prospective customer. Produce a lead summary for the business owner.

Rules:
- Only use facts the customer stated. If a field was not stated, return null. Never guess.
- email and phone must be copied exactly as the customer wrote them.
- handoff_ready is true only when the customer gave a way to contact them AND described \
what they need, or explicitly asked for a call, visit or quote.
- missing_info lists short labels for what a follow-up still needs (e.g. \"phone\", \"address\").
- next_steps, follow_up_questions and call_script are short imperative sentences for the owner.";

/// Head/tail split used when the transcript is over budget. The tail gets
/// the larger share because readiness depends on how the chat ended.
const HEAD_SHARE: f64 = 0.35;

/// One line per message: `[2024-05-01 14:03:11 UTC] Customer: text`.
pub fn render_transcript(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|line| {
            let when = chrono::DateTime::from_timestamp(line.timestamp, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| line.timestamp.to_string());
            let who = match line.speaker {
                Speaker::Customer => "Customer",
                Speaker::Assistant => "Assistant",
            };
            format!("[{when}] {who}: {}", line.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the first and last parts of `text` within `max_chars`, joined by a
/// marker stating how much was dropped.
pub fn truncate_head_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head_len = (max_chars as f64 * HEAD_SHARE) as usize;
    let tail_len = max_chars.saturating_sub(head_len);
    let omitted = total - head_len - tail_len;

    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();
    format!("{head}\n\n[... {omitted} characters omitted ...]\n\n{tail}")
}

fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

/// JSON schema for `response_format`. Strict mode requires every property
/// to be listed in `required` and no additional properties.
pub fn summary_schema() -> Value {
    let nullable_fields = [
        "name",
        "email",
        "phone",
        "company",
        "location",
        "service",
        "timeline",
        "budget",
        "preferred_contact",
        "summary",
    ];
    let list_fields = ["next_steps", "follow_up_questions", "call_script", "missing_info"];

    let mut properties = serde_json::Map::new();
    for field in nullable_fields {
        properties.insert(field.to_string(), nullable_string());
    }
    properties.insert("handoff_ready".into(), json!({ "type": "boolean" }));
    properties.insert(
        "handoff_reason".into(),
        json!({
            "type": "string",
            "enum": [
                "contact_and_need_captured",
                "customer_requested_follow_up",
                "appointment_requested",
                "missing_contact",
                "missing_project_details",
                "conversation_in_progress",
                "not_a_lead"
            ]
        }),
    );
    for field in list_fields {
        properties.insert(field.to_string(), string_list());
    }

    let required: Vec<String> = properties.keys().cloned().collect();
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_speakers_and_utc_times() {
        let lines = vec![
            TranscriptLine {
                timestamp: 1_700_000_000,
                speaker: Speaker::Customer,
                text: "hi".into(),
            },
            TranscriptLine {
                timestamp: 1_700_000_005,
                speaker: Speaker::Assistant,
                text: "hello".into(),
            },
        ];
        assert_eq!(
            render_transcript(&lines),
            "[2023-11-14 22:13:20 UTC] Customer: hi\n[2023-11-14 22:13:25 UTC] Assistant: hello"
        );
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_head_tail("abc", 10), "abc");
    }

    #[test]
    fn long_text_keeps_head_and_tail() {
        let text = format!("START{}END", "x".repeat(1000));
        let out = truncate_head_tail(&text, 100);
        assert!(out.starts_with("START"));
        assert!(out.ends_with("END"));
        assert!(out.contains("characters omitted"));
        assert!(out.chars().count() < 200);
    }

    #[test]
    fn schema_requires_every_property() {
        let schema = summary_schema();
        let props = schema["properties"].as_object().unwrap();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(props.len(), required.len());
        assert_eq!(schema["additionalProperties"], false);
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text and HTML renderers for [`BodySection`] lists.

use std::fmt::Write;

use crate::sections::{AttachmentItem, BodySection, speaker_label};

/// Render sections as plain text.
pub fn render_text(sections: &[BodySection]) -> String {
    let mut out = String::new();
    for section in sections {
        match section {
            BodySection::Heading(title) => {
                let _ = writeln!(out, "{title}\n{}", "=".repeat(title.chars().count()));
            }
            BodySection::Fields(rows) => {
                for (label, value) in rows {
                    let _ = writeln!(out, "{label}: {value}");
                }
            }
            BodySection::Paragraph(text) => {
                let _ = writeln!(out, "{text}");
            }
            BodySection::Bullets { title, items } => {
                let _ = writeln!(out, "{title}:");
                for item in items {
                    let _ = writeln!(out, "  - {item}");
                }
            }
            BodySection::Transcript {
                assistant_name,
                lines,
            } => {
                for line in lines {
                    let who = speaker_label(line.speaker, assistant_name);
                    let _ = writeln!(out, "[{}] {who}: {}", clock(line.timestamp), line.text);
                }
            }
            BodySection::Attachments(items) => {
                for item in items {
                    let _ = writeln!(out, "  - {}{}: {}", item.name, inline_note(item), item.url);
                }
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string() + "\n"
}

/// Render sections as an HTML document. All text is escaped; inline images
/// are referenced by `cid:`.
pub fn render_html(sections: &[BodySection]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head>\n\
         <body style=\"font-family:Arial,Helvetica,sans-serif;font-size:14px;color:#222\">\n",
    );
    for section in sections {
        match section {
            BodySection::Heading(title) => {
                let _ = writeln!(out, "<h2 style=\"font-size:16px;margin:18px 0 6px\">{}</h2>", escape(title));
            }
            BodySection::Fields(rows) => {
                out.push_str("<table cellpadding=\"3\" style=\"border-collapse:collapse\">\n");
                for (label, value) in rows {
                    let _ = writeln!(
                        out,
                        "<tr><td style=\"color:#666;padding-right:12px\">{}</td><td>{}</td></tr>",
                        escape(label),
                        linkify_value(value)
                    );
                }
                out.push_str("</table>\n");
            }
            BodySection::Paragraph(text) => {
                let _ = writeln!(out, "<p>{}</p>", escape_multiline(text));
            }
            BodySection::Bullets { title, items } => {
                let _ = writeln!(out, "<p><strong>{}</strong></p>\n<ul>", escape(title));
                for item in items {
                    let _ = writeln!(out, "<li>{}</li>", escape(item));
                }
                out.push_str("</ul>\n");
            }
            BodySection::Transcript {
                assistant_name,
                lines,
            } => {
                out.push_str("<div>\n");
                for line in lines {
                    let who = speaker_label(line.speaker, assistant_name);
                    let _ = writeln!(
                        out,
                        "<p style=\"margin:4px 0\"><span style=\"color:#888\">[{}]</span> <strong>{}:</strong> {}</p>",
                        clock(line.timestamp),
                        escape(who),
                        escape_multiline(&line.text)
                    );
                }
                out.push_str("</div>\n");
            }
            BodySection::Attachments(items) => {
                out.push_str("<ul>\n");
                for item in items {
                    render_attachment(&mut out, item);
                }
                out.push_str("</ul>\n");
            }
        }
    }
    out.push_str("</body></html>\n");
    out
}

fn render_attachment(out: &mut String, item: &AttachmentItem) {
    let _ = write!(
        out,
        "<li><a href=\"{}\">{}</a>",
        escape(&item.url),
        escape(&item.name)
    );
    if let Some(cid) = &item.content_id {
        let _ = write!(
            out,
            "<br><img src=\"cid:{}\" alt=\"{}\" style=\"max-width:480px;height:auto\">",
            escape(cid),
            escape(&item.name)
        );
    }
    out.push_str("</li>\n");
}

fn inline_note(item: &AttachmentItem) -> &'static str {
    if item.content_id.is_some() {
        " (embedded)"
    } else {
        ""
    }
}

fn clock(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_multiline(s: &str) -> String {
    escape(s).replace('\n', "<br>\n")
}

/// Email addresses become `mailto:` links and http(s) URLs become links.
fn linkify_value(value: &str) -> String {
    let escaped = escape(value);
    if value.starts_with("https://") || value.starts_with("http://") {
        format!("<a href=\"{escaped}\">{escaped}</a>")
    } else if value.contains('@') && !value.contains(char::is_whitespace) {
        format!("<a href=\"mailto:{escaped}\">{escaped}</a>")
    } else {
        escaped
    }
}

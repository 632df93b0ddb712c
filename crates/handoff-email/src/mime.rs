// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw MIME message assembly.
//!
//! Layout: `multipart/mixed` holding a `multipart/alternative` (text, then
//! HTML) followed by one inline part per embedded image. All bodies are
//! base64 in 76-column lines; free-text headers fall back to RFC 2047
//! encoded words. Output depends only on the inputs, including the
//! boundaries, so the same inputs always produce the same bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

use handoff_core::types::InlineAttachment;

const CRLF: &str = "\r\n";
const BASE64_LINE: usize = 76;
/// Raw bytes per encoded word, keeping each word under 75 characters.
const WORD_BYTES: usize = 45;

/// Boundary strings for one message. Generated once per send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundaries {
    pub mixed: String,
    pub alternative: String,
}

impl Boundaries {
    /// Fresh boundaries. `=_` cannot occur in base64 or encoded words, so
    /// these never collide with part content.
    pub fn generate() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            mixed: format!("=_mixed_{id}"),
            alternative: format!("=_alt_{id}"),
        }
    }
}

/// Everything that goes into one raw message.
#[derive(Debug, Clone, Copy)]
pub struct OutgoingMessage<'a> {
    pub from: &'a str,
    pub to: &'a [String],
    pub reply_to: Option<&'a str>,
    pub subject: &'a str,
    pub date: DateTime<Utc>,
    pub message_id: &'a str,
    pub text: &'a str,
    pub html: &'a str,
    pub inline: &'a [InlineAttachment],
}

/// `<uuid@domain>`, with the domain taken from the sender address.
pub fn new_message_id(from: &str) -> String {
    let domain = mailbox_address(from)
        .rsplit_once('@')
        .map(|(_, d)| d.to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "handoff.local".to_string());
    format!("<{}@{domain}>", uuid::Uuid::new_v4().simple())
}

/// Build the raw message bytes.
pub fn assemble(msg: &OutgoingMessage<'_>, boundaries: &Boundaries) -> Vec<u8> {
    let mut out = String::new();

    header(&mut out, "From", &encode_mailbox(msg.from));
    let to: Vec<String> = msg.to.iter().map(|t| encode_mailbox(t)).collect();
    header(&mut out, "To", &to.join(", "));
    if let Some(reply_to) = msg.reply_to {
        header(&mut out, "Reply-To", &encode_mailbox(reply_to));
    }
    header(&mut out, "Subject", &encode_word(msg.subject));
    header(&mut out, "Date", &msg.date.to_rfc2822());
    header(&mut out, "Message-ID", msg.message_id);
    header(&mut out, "MIME-Version", "1.0");
    header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{}\"", boundaries.mixed),
    );
    out.push_str(CRLF);
    out.push_str("This is a multi-part message in MIME format.");
    out.push_str(CRLF);

    open_part(&mut out, &boundaries.mixed);
    header(
        &mut out,
        "Content-Type",
        &format!("multipart/alternative; boundary=\"{}\"", boundaries.alternative),
    );
    out.push_str(CRLF);

    open_part(&mut out, &boundaries.alternative);
    body_part(&mut out, "text/plain; charset=utf-8", &[], msg.text.as_bytes());
    open_part(&mut out, &boundaries.alternative);
    body_part(&mut out, "text/html; charset=utf-8", &[], msg.html.as_bytes());
    close_parts(&mut out, &boundaries.alternative);

    for attachment in msg.inline {
        open_part(&mut out, &boundaries.mixed);
        let filename = parameter_value(&attachment.filename);
        body_part(
            &mut out,
            &format!("{}; name={filename}", attachment.mime_type),
            &[
                ("Content-ID", format!("<{}>", attachment.content_id)),
                ("Content-Disposition", format!("inline; filename={filename}")),
            ],
            &attachment.bytes,
        );
    }
    close_parts(&mut out, &boundaries.mixed);

    out.into_bytes()
}

fn header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

fn open_part(out: &mut String, boundary: &str) {
    out.push_str("--");
    out.push_str(boundary);
    out.push_str(CRLF);
}

fn close_parts(out: &mut String, boundary: &str) {
    out.push_str("--");
    out.push_str(boundary);
    out.push_str("--");
    out.push_str(CRLF);
}

fn body_part(out: &mut String, content_type: &str, extra: &[(&str, String)], bytes: &[u8]) {
    header(out, "Content-Type", content_type);
    header(out, "Content-Transfer-Encoding", "base64");
    for (name, value) in extra {
        header(out, name, value);
    }
    out.push_str(CRLF);
    out.push_str(&wrap_base64(bytes));
}

/// Base64 in lines of at most 76 characters, each CRLF-terminated.
pub fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE * 2 + 2);
    for line in encoded.as_bytes().chunks(BASE64_LINE) {
        // Base64 output is ASCII, so byte chunks are valid UTF-8.
        out.push_str(std::str::from_utf8(line).unwrap_or_default());
        out.push_str(CRLF);
    }
    out
}

/// Strip characters that could end a header line early.
fn header_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// The value unchanged when it is printable ASCII, otherwise a folded
/// sequence of `=?UTF-8?B?…?=` words.
pub fn encode_word(value: &str) -> String {
    let value = header_safe(value);
    if value.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return value;
    }
    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > WORD_BYTES {
            words.push(format!("=?UTF-8?B?{}?=", STANDARD.encode(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(format!("=?UTF-8?B?{}?=", STANDARD.encode(chunk.as_bytes())));
    }
    words.join("\r\n ")
}

/// `Display Name <addr>` with the display name made 7-bit safe.
pub fn encode_mailbox(mailbox: &str) -> String {
    let mailbox = header_safe(mailbox);
    let Some((name, rest)) = mailbox.rsplit_once('<') else {
        return mailbox;
    };
    let address = rest.trim_end_matches('>').trim();
    let name = name.trim().trim_matches('"').trim();
    if name.is_empty() {
        return format!("<{address}>");
    }
    let display = if !name.is_ascii() {
        encode_word(name)
    } else if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        name.to_string()
    };
    format!("{display} <{address}>")
}

/// Bare address from `Name <addr>` or `addr`.
pub fn mailbox_address(mailbox: &str) -> &str {
    match mailbox.rsplit_once('<') {
        Some((_, rest)) => rest.trim_end().trim_end_matches('>').trim(),
        None => mailbox.trim(),
    }
}

/// A quoted MIME parameter value, or an encoded word for non-ASCII names.
fn parameter_value(value: &str) -> String {
    let value = header_safe(value);
    if value.is_ascii() {
        format!("\"{}\"", value.replace('\\', "_").replace('"', "'"))
    } else {
        format!("\"{}\"", encode_word(&value).replace("\r\n ", " "))
    }
}

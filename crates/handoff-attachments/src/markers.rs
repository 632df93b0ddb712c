// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment marker parsing.
//!
//! A marker row looks like `Attachment: <name> (<mime>) <url>`. The URL is the
//! last token, the MIME type is an optional trailing parenthesized token, and
//! whatever remains is the display name.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use handoff_core::types::{ATTACHMENT_MARKER, AttachmentRef, Speaker, TranscriptLine};

use crate::keys::storage_key;

/// Collect attachment references from customer-authored lines, in transcript
/// order, one per distinct URL.
pub fn extract_attachments(lines: &[TranscriptLine]) -> Vec<AttachmentRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for line in lines.iter().filter(|l| l.speaker == Speaker::Customer) {
        for row in line.text.lines() {
            let Some(attachment) = parse_marker(row) else {
                continue;
            };
            if seen.insert(attachment.url.clone()) {
                refs.push(attachment);
            }
        }
    }
    refs
}

/// Parse one marker row. Returns `None` for non-marker rows and for markers
/// whose URL is not well-formed `http`/`https`.
pub fn parse_marker(row: &str) -> Option<AttachmentRef> {
    let body = row.trim().strip_prefix(ATTACHMENT_MARKER)?.trim();
    let (rest, raw_url) = match body.rsplit_once(char::is_whitespace) {
        Some((rest, url)) => (rest.trim_end(), url),
        None => ("", body),
    };

    let url = match allowed_url(raw_url) {
        Some(url) => url,
        None => {
            debug!(url = raw_url, "dropping attachment marker with disallowed url");
            return None;
        }
    };

    let (name, mime_type) = split_mime(rest);
    let display_name = if name.is_empty() {
        fallback_name(&url)
    } else {
        name.to_string()
    };

    Some(AttachmentRef {
        display_name,
        mime_type,
        storage_key: storage_key(&url, raw_url),
        url: raw_url.to_string(),
    })
}

fn allowed_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return None;
    }
    Some(url)
}

/// Split a trailing `(type/subtype)` off the name part.
fn split_mime(rest: &str) -> (&str, Option<String>) {
    if let Some(inner) = rest.strip_suffix(')') {
        if let Some(open) = inner.rfind('(') {
            let candidate = &inner[open + 1..];
            if looks_like_mime(candidate) {
                return (inner[..open].trim_end(), Some(candidate.to_ascii_lowercase()));
            }
        }
    }
    (rest, None)
}

fn looks_like_mime(s: &str) -> bool {
    match s.split_once('/') {
        Some((top, sub)) => {
            !top.is_empty()
                && !sub.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || "/.+-_".contains(c))
        }
        None => false,
    }
}

fn fallback_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| "attachment".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(text: &str) -> TranscriptLine {
        TranscriptLine {
            timestamp: 1,
            speaker: Speaker::Customer,
            text: text.into(),
        }
    }

    #[test]
    fn parses_name_mime_and_url() {
        let a = parse_marker(
            "Attachment: roof photo (1).jpg (image/JPEG) https://files.example.com/u/abc.jpg",
        )
        .unwrap();
        assert_eq!(a.display_name, "roof photo (1).jpg");
        assert_eq!(a.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(a.url, "https://files.example.com/u/abc.jpg");
        assert_eq!(a.storage_key.as_deref(), Some("abc.jpg"));
    }

    #[test]
    fn name_is_optional() {
        let a = parse_marker("Attachment: https://files.example.com/u/pic.png").unwrap();
        assert_eq!(a.display_name, "pic.png");
        assert_eq!(a.mime_type, None);
    }

    #[test]
    fn disallowed_schemes_are_dropped() {
        for row in [
            "Attachment: x (image/png) javascript:alert(1)",
            "Attachment: x (image/png) ftp://files.example.com/a.png",
            "Attachment: x (image/png) data:image/png;base64,AAAA",
            "Attachment: x (image/png) not-a-url",
            "Attachment: x (image/png) file:///etc/passwd",
        ] {
            assert!(parse_marker(row).is_none(), "{row}");
        }
    }

    #[test]
    fn non_marker_rows_are_ignored() {
        assert!(parse_marker("Here is my attachment: https://x.example/a").is_none());
        assert!(parse_marker("").is_none());
    }

    #[test]
    fn deduplicates_by_exact_url_across_lines() {
        let lines = vec![
            customer("first\nAttachment: a.jpg (image/jpeg) https://x.example/a.jpg"),
            customer("Attachment: again.jpg https://x.example/a.jpg"),
            customer("Attachment: b.jpg https://x.example/b.jpg"),
        ];
        let refs = extract_attachments(&lines);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].display_name, "a.jpg");
        assert_eq!(refs[1].url, "https://x.example/b.jpg");
    }

    #[test]
    fn assistant_lines_are_not_scanned() {
        let lines = vec![TranscriptLine {
            timestamp: 1,
            speaker: Speaker::Assistant,
            text: "Attachment: a.jpg https://x.example/a.jpg".into(),
        }];
        assert!(extract_attachments(&lines).is_empty());
    }

    #[test]
    fn traversal_in_path_keeps_link_but_drops_key() {
        let a = parse_marker("Attachment: a.jpg https://x.example/uploads/../secret/a.jpg").unwrap();
        assert_eq!(a.storage_key, None);
        assert_eq!(a.url, "https://x.example/uploads/../secret/a.jpg");
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object-store key recovery from attachment URLs.

use url::Url;

const MAX_KEY_LEN: usize = 256;

/// Encoded and plain spellings of a parent-directory step.
const TRAVERSAL_PATTERNS: [&str; 4] = ["..", "%2e%2e", ".%2e", "%2e."];

/// Recover a safe relative object key from the `id` query parameter or the
/// final path segment.
///
/// `raw` is the URL as written; it is screened for traversal before parsing
/// because URL normalization silently resolves `../` segments.
pub fn storage_key(url: &Url, raw: &str) -> Option<String> {
    let lowered = raw.to_ascii_lowercase();
    if TRAVERSAL_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return None;
    }

    let candidate = url
        .query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(String::from)
        })?;

    is_safe_key(&candidate).then_some(candidate)
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('/')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> Option<String> {
        storage_key(&Url::parse(raw).unwrap(), raw)
    }

    #[test]
    fn prefers_id_query_parameter() {
        assert_eq!(
            key("https://x.example/api/file?id=uploads/2024/abc-1.jpg&sig=zz").as_deref(),
            Some("uploads/2024/abc-1.jpg")
        );
    }

    #[test]
    fn falls_back_to_last_segment() {
        assert_eq!(key("https://x.example/u/a_b.png").as_deref(), Some("a_b.png"));
    }

    #[test]
    fn rejects_traversal_in_any_spelling() {
        for raw in [
            "https://x.example/a/../b.png",
            "https://x.example/file?id=../../etc/passwd",
            "https://x.example/file?id=%2e%2e/secret",
            "https://x.example/file?id=.%2E/secret",
            "https://x.example/file?id=%2E./secret",
        ] {
            assert_eq!(key(raw), None, "{raw}");
        }
    }

    #[test]
    fn rejects_unsafe_characters() {
        assert_eq!(key("https://x.example/u/my%20photo.jpg"), None);
        assert_eq!(key("https://x.example/file?id=/abs/path.jpg"), None);
        assert_eq!(key("https://x.example/"), None);
    }
}

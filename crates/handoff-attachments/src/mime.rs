// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MIME type resolution for inline candidates.

/// Used when neither the marker, the response, nor the filename says anything.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Image types that may be embedded. SVG is excluded because it can carry script.
const INLINE_IMAGE_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/bmp",
];

/// Lowercased `type/subtype` with parameters removed, or `None` when the value
/// is empty or carries no information.
pub fn essence(value: &str) -> Option<String> {
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "" | "application/octet-stream" | "binary/octet-stream" => None,
        _ if essence.contains('/') => Some(essence),
        _ => None,
    }
}

/// Stated type, else response content type, else filename extension, else
/// [`DEFAULT_IMAGE_MIME`].
pub fn resolve_mime(stated: Option<&str>, content_type: Option<&str>, filename: &str) -> String {
    stated
        .and_then(essence)
        .or_else(|| content_type.and_then(essence))
        .or_else(|| from_extension(filename).map(String::from))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

/// Whether a resolved type may be embedded inline.
pub fn is_inline_image(mime: &str) -> bool {
    INLINE_IMAGE_TYPES.contains(&mime)
}

fn from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_order() {
        assert_eq!(resolve_mime(Some("image/png"), Some("image/gif"), "a.jpg"), "image/png");
        assert_eq!(
            resolve_mime(None, Some("image/gif; charset=binary"), "a.jpg"),
            "image/gif"
        );
        assert_eq!(
            resolve_mime(None, Some("application/octet-stream"), "a.webp"),
            "image/webp"
        );
        assert_eq!(resolve_mime(None, None, "upload"), DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn only_raster_images_inline() {
        assert!(is_inline_image("image/jpeg"));
        assert!(!is_inline_image("image/svg+xml"));
        assert!(!is_inline_image("application/pdf"));
    }
}

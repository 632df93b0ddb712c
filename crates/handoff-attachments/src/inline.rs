// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, concurrent inlining of image attachments.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use handoff_config::model::AttachmentsConfig;
use handoff_core::types::{AttachmentRef, FetchedBody, InlineAttachment};
use handoff_core::{AttachmentFetcher, HandoffError};

use crate::mime::{is_inline_image, resolve_mime};

/// Ceilings applied while inlining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineLimits {
    pub max_bytes: u64,
    pub max_total_bytes: u64,
    pub max_count: usize,
    pub concurrency: usize,
    pub fetch_timeout: Duration,
}

impl From<&AttachmentsConfig> for InlineLimits {
    fn from(config: &AttachmentsConfig) -> Self {
        Self {
            max_bytes: config.max_inline_bytes,
            max_total_bytes: config.max_total_inline_bytes,
            max_count: config.max_inline_count,
            concurrency: config.fetch_concurrency.max(1),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

/// Fetches image attachments and turns them into inline parts.
///
/// Every failure is per attachment: the reference stays in the visible link
/// list and the message goes out without it embedded.
pub struct Inliner {
    fetcher: Arc<dyn AttachmentFetcher>,
    limits: InlineLimits,
}

impl Inliner {
    pub fn new(fetcher: Arc<dyn AttachmentFetcher>, limits: InlineLimits) -> Self {
        Self { fetcher, limits }
    }

    /// Inline what fits, in reference order.
    ///
    /// Fetches run concurrently up to the configured limit; results are
    /// consumed in input order so the count and total ceilings are applied
    /// deterministically.
    pub async fn inline_all(&self, refs: &[AttachmentRef]) -> Vec<InlineAttachment> {
        let candidates: Vec<&AttachmentRef> = refs
            .iter()
            .filter(|r| {
                let stated = r.mime_type.as_deref();
                let keep = stated.is_none_or(|m| is_inline_image(m));
                if !keep {
                    debug!(url = %r.url, mime = ?stated, "attachment is not an inline image type");
                }
                keep
            })
            .collect();

        let fetches: Vec<_> = candidates
            .into_iter()
            .map(|r| async move { (r, self.fetch_one(r).await) })
            .collect();
        let fetched: Vec<_> = stream::iter(fetches)
            .buffered(self.limits.concurrency)
            .collect()
            .await;

        let mut inline = Vec::new();
        let mut total: u64 = 0;
        for (r, result) in fetched {
            let part = match result {
                Ok(part) => part,
                Err(e) => {
                    warn!(url = %r.url, kind = %e.kind(), error = %e, "attachment not inlined");
                    continue;
                }
            };
            if inline.len() >= self.limits.max_count {
                warn!(url = %r.url, max = self.limits.max_count, "inline attachment count reached");
                continue;
            }
            let size = part.bytes.len() as u64;
            if total + size > self.limits.max_total_bytes {
                warn!(url = %r.url, size, total, "inline byte budget exhausted");
                continue;
            }
            total += size;
            inline.push(InlineAttachment {
                content_id: content_id(inline.len()),
                ..part
            });
        }
        inline
    }

    async fn fetch_one(&self, r: &AttachmentRef) -> Result<InlineAttachment, HandoffError> {
        let body: FetchedBody = tokio::time::timeout(
            self.limits.fetch_timeout,
            self.fetcher.fetch(&r.url, self.limits.max_bytes),
        )
        .await
        .map_err(|_| HandoffError::Timeout {
            duration: self.limits.fetch_timeout,
        })??;

        let mime = resolve_mime(
            r.mime_type.as_deref(),
            body.content_type.as_deref(),
            &r.display_name,
        );
        if !is_inline_image(&mime) {
            return Err(HandoffError::UnsupportedType { mime });
        }

        Ok(InlineAttachment {
            content_id: String::new(),
            filename: r.display_name.clone(),
            mime_type: mime,
            bytes: body.bytes,
            source_url: r.url.clone(),
        })
    }
}

/// `att-<index>-<uuid>@handoff`, unique per message.
fn content_id(index: usize) -> String {
    format!("att-{index}-{}@handoff", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use handoff_core::{AdapterType, HealthStatus, PluginAdapter};
    use std::collections::HashMap;

    /// Serves canned bodies by URL; unknown URLs fail.
    struct MapFetcher(HashMap<String, (Vec<u8>, Option<String>)>);

    #[async_trait]
    impl PluginAdapter for MapFetcher {
        fn name(&self) -> &str {
            "map"
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::AttachmentFetcher
        }
        async fn health_check(&self) -> Result<HealthStatus, HandoffError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl AttachmentFetcher for MapFetcher {
        async fn fetch(&self, url: &str, max_bytes: u64) -> Result<FetchedBody, HandoffError> {
            let (bytes, content_type) = self
                .0
                .get(url)
                .cloned()
                .ok_or_else(|| HandoffError::fetch("404"))?;
            if bytes.len() as u64 > max_bytes {
                return Err(HandoffError::TooLarge {
                    size: bytes.len() as u64,
                    limit: max_bytes,
                });
            }
            Ok(FetchedBody {
                bytes,
                content_type,
            })
        }
    }

    fn reference(url: &str, mime: Option<&str>) -> AttachmentRef {
        AttachmentRef {
            display_name: url.rsplit('/').next().unwrap().to_string(),
            mime_type: mime.map(String::from),
            url: url.to_string(),
            storage_key: None,
        }
    }

    fn limits() -> InlineLimits {
        InlineLimits {
            max_bytes: 100,
            max_total_bytes: 150,
            max_count: 8,
            concurrency: 4,
            fetch_timeout: Duration::from_secs(5),
        }
    }

    fn fetcher(entries: &[(&str, usize, Option<&str>)]) -> Arc<dyn AttachmentFetcher> {
        Arc::new(MapFetcher(
            entries
                .iter()
                .map(|(u, n, ct)| (u.to_string(), (vec![7u8; *n], ct.map(String::from))))
                .collect(),
        ))
    }

    #[tokio::test]
    async fn inlines_images_and_skips_failures() {
        let inliner = Inliner::new(
            fetcher(&[
                ("https://x.example/a.jpg", 10, Some("image/jpeg")),
                ("https://x.example/big.jpg", 500, None),
                ("https://x.example/doc.pdf", 10, Some("application/pdf")),
            ]),
            limits(),
        );
        let refs = vec![
            reference("https://x.example/a.jpg", Some("image/jpeg")),
            reference("https://x.example/big.jpg", None),
            reference("https://x.example/missing.png", None),
            reference("https://x.example/doc.pdf", None),
            reference("https://x.example/notes.txt", Some("text/plain")),
        ];
        let inline = inliner.inline_all(&refs).await;
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].source_url, "https://x.example/a.jpg");
        assert!(inline[0].content_id.starts_with("att-0-"));
        assert!(inline[0].content_id.ends_with("@handoff"));
    }

    #[tokio::test]
    async fn total_budget_and_count_are_enforced_in_order() {
        let inliner = Inliner::new(
            fetcher(&[
                ("https://x.example/1.png", 80, None),
                ("https://x.example/2.png", 80, None),
                ("https://x.example/3.png", 60, None),
            ]),
            limits(),
        );
        let refs = vec![
            reference("https://x.example/1.png", None),
            reference("https://x.example/2.png", None),
            reference("https://x.example/3.png", None),
        ];
        let inline = inliner.inline_all(&refs).await;
        let urls: Vec<_> = inline.iter().map(|a| a.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.example/1.png", "https://x.example/3.png"]);
        assert!(inline[1].content_id.starts_with("att-1-"));

        let one = Inliner::new(
            fetcher(&[("https://x.example/1.png", 10, None), ("https://x.example/2.png", 10, None)]),
            InlineLimits {
                max_count: 1,
                ..limits()
            },
        );
        assert_eq!(one.inline_all(&refs[..2]).await.len(), 1);
    }

    #[tokio::test]
    async fn response_content_type_decides_when_unstated() {
        let inliner = Inliner::new(
            fetcher(&[("https://x.example/upload", 10, Some("image/png"))]),
            limits(),
        );
        let inline = inliner
            .inline_all(&[reference("https://x.example/upload", None)])
            .await;
        assert_eq!(inline[0].mime_type, "image/png");
    }
}

// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client construction with the service's transport policy.

use std::sync::Arc;
use std::time::Duration;

use handoff_core::HandoffError;
use reqwest::header::HeaderMap;
use tracing::error;

use crate::ssrf::{SsrfPolicy, SsrfSafeResolver};

/// Client for calls to configured APIs (conversation, summarizer).
///
/// TLS 1.2 minimum. Hosts are operator-configured, so no SSRF filtering.
pub fn build_api_client(
    timeout: Duration,
    headers: HeaderMap,
) -> Result<reqwest::Client, HandoffError> {
    reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            error!("failed to build api client: {e}");
            HandoffError::Config(format!("failed to build api client: {e}"))
        })
}

/// Client for user-supplied URLs (attachment downloads).
///
/// Resolution goes through [`SsrfSafeResolver`] and redirects are not
/// followed, so a public URL cannot bounce the request to a private host.
pub fn build_fetch_client(
    policy: SsrfPolicy,
    timeout: Duration,
) -> Result<reqwest::Client, HandoffError> {
    reqwest::Client::builder()
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .dns_resolver(Arc::new(SsrfSafeResolver::new(policy)))
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()
        .map_err(|e| {
            error!("failed to build fetch client: {e}");
            HandoffError::Config(format!("failed to build fetch client: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_build() {
        assert!(build_api_client(Duration::from_secs(5), HeaderMap::new()).is_ok());
        assert!(build_fetch_client(SsrfPolicy::default(), Duration::from_secs(5)).is_ok());
    }
}

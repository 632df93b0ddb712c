// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer check for HTTP triggers that claim to be system retries.
//!
//! Widget triggers are unauthenticated. A `server_retry` trigger skips retry
//! scheduling, so over HTTP it must carry the configured retry token. With
//! no token configured, HTTP system retries are always rejected.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

#[derive(Clone, Default)]
pub struct RetryAuth {
    token: Option<String>,
}

impl RetryAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Whether `headers` carry the retry token.
    pub fn permits(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return false;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

impl std::fmt::Debug for RetryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryAuth")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn matching_token_is_permitted() {
        let auth = RetryAuth::new(Some("s3cret".into()));
        assert!(auth.permits(&bearer("s3cret")));
        assert!(!auth.permits(&bearer("wrong")));
        assert!(!auth.permits(&HeaderMap::new()));
    }

    #[test]
    fn no_token_fails_closed() {
        assert!(!RetryAuth::new(None).permits(&bearer("anything")));
        assert!(!RetryAuth::new(Some(String::new())).permits(&bearer("")));
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", RetryAuth::new(Some("s3cret".into())));
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[redacted]"));
    }
}

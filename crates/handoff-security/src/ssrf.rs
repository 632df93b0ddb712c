// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-side request forgery guard for attachment downloads.
//!
//! Attachment URLs come from end users, so every outbound fetch is checked
//! twice: literal IP hosts are screened before the request is built, and
//! hostnames are screened after DNS resolution by [`SsrfSafeResolver`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use handoff_core::HandoffError;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::{debug, warn};
use url::{Host, Url};

/// Which addresses outbound fetches may reach.
#[derive(Debug, Clone, Default)]
pub struct SsrfPolicy {
    allowed_private_ips: Arc<Vec<IpAddr>>,
}

impl SsrfPolicy {
    /// Build a policy. Unparseable entries are skipped (config validation
    /// reports them).
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed_private_ips: Arc::new(
                allowed.iter().filter_map(|s| s.parse().ok()).collect(),
            ),
        }
    }

    /// Whether a connection to `ip` is permitted.
    pub fn permits(&self, ip: &IpAddr) -> bool {
        !is_private_ip(ip) || self.allowed_private_ips.contains(ip)
    }

    /// Parse and screen an attachment URL.
    ///
    /// Only `http` and `https` with a host are accepted. A literal IP host
    /// must pass [`SsrfPolicy::permits`]; hostnames are left to the resolver.
    pub fn check_url(&self, raw: &str) -> Result<Url, HandoffError> {
        let url = Url::parse(raw)
            .map_err(|e| HandoffError::fetch(format!("invalid attachment url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HandoffError::fetch(format!(
                "scheme `{}` is not allowed for attachments",
                url.scheme()
            )));
        }
        let ip = match url.host() {
            None => return Err(HandoffError::fetch("attachment url has no host")),
            Some(Host::Ipv4(v4)) => Some(IpAddr::V4(v4)),
            Some(Host::Ipv6(v6)) => Some(IpAddr::V6(v6)),
            Some(Host::Domain(_)) => None,
        };
        if let Some(ip) = ip {
            if !self.permits(&ip) {
                warn!(%ip, "blocked attachment url targeting private address");
                return Err(HandoffError::fetch(format!(
                    "attachment url targets private address {ip}"
                )));
            }
        }
        Ok(url)
    }
}

/// True for loopback, RFC 1918, link-local, CGNAT, broadcast, multicast,
/// unspecified and IPv6 unique-local / link-local addresses.
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_v4(&mapped);
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

fn is_private_v4(v4: &Ipv4Addr) -> bool {
    let [a, b, ..] = v4.octets();
    v4.is_private()
        || v4.is_loopback()
        || v4.is_link_local()
        || v4.is_broadcast()
        || v4.is_unspecified()
        || v4.is_multicast()
        || (a == 100 && (b & 0xc0) == 64)
}

/// DNS resolver that drops addresses the policy does not permit.
pub struct SsrfSafeResolver {
    policy: SsrfPolicy,
}

impl SsrfSafeResolver {
    pub fn new(policy: SsrfPolicy) -> Self {
        Self { policy }
    }
}

impl Resolve for SsrfSafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let policy = self.policy.clone();
        let host = name.as_str().to_string();

        Box::pin(async move {
            let resolved: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?
                .collect();

            let permitted: Vec<SocketAddr> = resolved
                .into_iter()
                .filter(|addr| {
                    let ok = policy.permits(&addr.ip());
                    if !ok {
                        debug!(ip = %addr.ip(), %host, "dropping private address from resolution");
                    }
                    ok
                })
                .collect();

            if permitted.is_empty() {
                warn!(%host, "blocked host that resolves only to private addresses");
                let err: Box<dyn std::error::Error + Send + Sync> =
                    format!("{host} resolves only to private addresses").into();
                return Err(err);
            }
            let addrs: Addrs = Box::new(permitted.into_iter());
            Ok(addrs)
        })
    }
}

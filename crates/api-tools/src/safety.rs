//! Outbound HTTP safety controls for requests that leave the configured base URL
//! (SSRF protection) and redaction helpers for error messages.

use crate::upstream::UpstreamError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio::net::lookup_host;
use url::Url;

/// Most hops followed for one external fetch.
pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Do not follow redirects; a 3xx is reported as a status error.
    None,
    /// Follow redirects, but re-check the destination URL on each hop.
    Checked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundHttpSafety {
    /// If true, allow private/loopback/link-local/reserved destination IPs.
    pub allow_private_networks: bool,
    /// Redirect behavior.
    pub redirects: RedirectPolicy,
}

impl Default for OutboundHttpSafety {
    fn default() -> Self {
        Self::restricted()
    }
}

impl OutboundHttpSafety {
    /// Any http(s) destination, including local ones.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allow_private_networks: true,
            redirects: RedirectPolicy::Checked,
        }
    }

    /// Public destinations only.
    #[must_use]
    pub fn restricted() -> Self {
        Self {
            allow_private_networks: false,
            redirects: RedirectPolicy::Checked,
        }
    }

    /// Validate a URL before making an outbound request.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Blocked`] for non-`http(s)` schemes, URLs without a host, and
    /// (unless private networks are allowed) hosts resolving to a disallowed IP range.
    pub async fn check_url(&self, url: &Url) -> Result<(), UpstreamError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(UpstreamError::Blocked(format!(
                "unsupported URL scheme '{scheme}'"
            )));
        }

        let Some(host) = url.host_str() else {
            return Err(UpstreamError::Blocked("missing URL host".to_string()));
        };

        if self.allow_private_networks {
            return Ok(());
        }

        // IPv6 literals come back bracketed from `host_str`.
        let literal = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return if is_denied_ip(ip) {
                Err(UpstreamError::Blocked(format!(
                    "destination IP '{ip}' is not allowed"
                )))
            } else {
                Ok(())
            };
        }

        let port = url.port_or_known_default().unwrap_or(443);
        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| UpstreamError::Transport(format!("DNS lookup failed for host '{host}': {e}")))?;

        let mut saw_any = false;
        for addr in addrs {
            saw_any = true;
            if is_denied_ip(addr.ip()) {
                return Err(UpstreamError::Blocked(format!(
                    "host '{host}' resolved to disallowed IP '{}'",
                    addr.ip()
                )));
            }
        }

        if !saw_any {
            return Err(UpstreamError::Transport(format!(
                "DNS lookup returned no addresses for host '{host}'"
            )));
        }

        Ok(())
    }

    /// Resolve a `Location` header against the URL that answered with it and validate the
    /// result the same way as the first URL.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Blocked`] for an unparsable location or a disallowed target.
    pub async fn check_redirect(&self, from: &Url, location: &str) -> Result<Url, UpstreamError> {
        let next = from.join(location).map_err(|e| {
            UpstreamError::Blocked(format!("invalid redirect location '{location}': {e}"))
        })?;
        self.check_url(&next).await?;
        Ok(next)
    }
}

/// Drop credentials, query and fragment from a URL before logging it.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

fn is_denied_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_denied_ipv4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_denied_ipv4(v4),
            None => is_denied_ipv6(v6),
        },
    }
}

fn is_denied_ipv4(ip: Ipv4Addr) -> bool {
    let oct = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        // includes cloud metadata at 169.254.169.254
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        // CGNAT 100.64.0.0/10
        || (oct[0] == 100 && (64..=127).contains(&oct[1]))
        || oct[0] >= 240
}

fn is_denied_ipv6(ip: Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || ip.is_unique_local()
        || ip.is_unicast_link_local()
}

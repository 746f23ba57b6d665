//! Connection targets derived from site URLs.

use std::fmt;
use std::time::Duration;

use crate::config::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_HTTPS_PORT};

/// A host and port to fetch a certificate from.
///
/// `hostname` is always the ASCII (IDNA) form; non-ASCII input is punycoded
/// when the endpoint is built, so the same form goes into DNS, SNI and the
/// fetch cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// ASCII hostname or IP literal
    pub hostname: String,
    /// TCP port
    pub port: u16,
    /// Connect and handshake timeout
    pub timeout: Duration,
}

impl Endpoint {
    /// Creates an endpoint for an already-normalized hostname.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Replaces the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds an endpoint from a site URL or a bare domain.
    ///
    /// Adds an `https://` prefix when the scheme is missing. The port is the
    /// one written in the URL, or 443 regardless of scheme.
    pub fn from_site(site: &str) -> Result<Self, String> {
        let site = site.trim();
        let normalized = if site.contains("://") {
            site.to_string()
        } else {
            format!("https://{site}")
        };

        let parsed = url::Url::parse(&normalized).map_err(|e| format!("invalid URL {site:?}: {e}"))?;
        let hostname = match parsed.host() {
            Some(url::Host::Domain(domain)) => domain.trim_end_matches('.').to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(format!("URL {site:?} has no host")),
        };
        if hostname.is_empty() {
            return Err(format!("URL {site:?} has an empty host"));
        }
        let port = parsed.port().unwrap_or(DEFAULT_HTTPS_PORT);

        Ok(Self::new(hostname, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.contains(':') {
            write!(f, "[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "{}:{}", self.hostname, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_site_defaults_port() {
        let endpoint = Endpoint::from_site("https://python.org/").unwrap();
        assert_eq!(endpoint.hostname, "python.org");
        assert_eq!(endpoint.port, 443);
        assert_eq!(endpoint.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_site_explicit_port() {
        let endpoint = Endpoint::from_site("https://example.com:8443/path?q=1").unwrap();
        assert_eq!(endpoint.hostname, "example.com");
        assert_eq!(endpoint.port, 8443);
    }

    #[test]
    fn test_from_site_http_scheme_still_uses_443() {
        let endpoint = Endpoint::from_site("http://example.com/").unwrap();
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn test_from_site_bare_domain() {
        let endpoint = Endpoint::from_site("example.com").unwrap();
        assert_eq!(endpoint.hostname, "example.com");
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn test_from_site_punycodes_and_lowercases() {
        let endpoint = Endpoint::from_site("https://Bücher.Example/").unwrap();
        assert_eq!(endpoint.hostname, "xn--bcher-kva.example");
    }

    #[test]
    fn test_from_site_strips_trailing_dot() {
        let endpoint = Endpoint::from_site("https://example.com./").unwrap();
        assert_eq!(endpoint.hostname, "example.com");
    }

    #[test]
    fn test_from_site_ip_literals() {
        let v4 = Endpoint::from_site("https://127.0.0.1:8443/").unwrap();
        assert_eq!(v4.hostname, "127.0.0.1");
        let v6 = Endpoint::from_site("https://[::1]:8443/").unwrap();
        assert_eq!(v6.hostname, "::1");
        assert_eq!(v6.to_string(), "[::1]:8443");
    }

    #[test]
    fn test_from_site_rejects_garbage() {
        assert!(Endpoint::from_site("https://exa mple.com/").is_err());
        assert!(Endpoint::from_site("https://").is_err());
    }
}

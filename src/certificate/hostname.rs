//! Hostname matching against certificate names.
//!
//! Matching rules:
//! - Candidates are the SAN DNS entries when the extension is present,
//!   otherwise the subject common name
//! - A wildcard is only honoured as the whole leftmost label (`*.example.com`)
//!   and stands for exactly one non-empty label
//! - Wildcards need at least two labels after them, so `*.com` never matches
//! - Both sides are IDNA-encoded and lower-cased before comparison
//! - IP addresses never match DNS names
//!
//! Malformed input on either side is a non-match, never an error.

use std::net::IpAddr;

use super::ParsedCertificate;

/// Returns the ASCII (IDNA) form of a hostname, or the canonical text of an
/// IP literal. Returns `None` for input that is neither.
pub fn to_ascii_hostname(name: &str) -> Option<String> {
    let trimmed = name.trim().trim_end_matches('.');
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return Some(ip.to_string());
    }
    normalize_dns_name(trimmed)
}

/// Lower-cased A-label form of a DNS name; `None` for IPs and garbage.
fn normalize_dns_name(name: &str) -> Option<String> {
    let name = name.trim().trim_end_matches('.');
    if name.is_empty() || name.parse::<IpAddr>().is_ok() {
        return None;
    }
    // Host::parse percent-decodes, so reject anything outside LDH first.
    if name
        .chars()
        .any(|c| c.is_ascii() && !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
    {
        return None;
    }
    match url::Host::parse(name) {
        Ok(url::Host::Domain(domain)) => {
            if domain.split('.').any(str::is_empty) {
                None
            } else {
                Some(domain)
            }
        }
        _ => None,
    }
}

/// Returns true when `host` (already normalized) is covered by `pattern`.
fn matches_name(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim().trim_end_matches('.');

    if let Some(suffix) = pattern.strip_prefix("*.") {
        if suffix.contains('*') {
            return false;
        }
        let Some(suffix) = normalize_dns_name(suffix) else {
            return false;
        };
        if !suffix.contains('.') {
            return false;
        }
        return match host.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        };
    }

    if pattern.contains('*') {
        return false;
    }
    normalize_dns_name(pattern).is_some_and(|p| p == host)
}

/// Returns true when `cert` is valid for `hostname`.
pub fn matches_hostname(cert: &ParsedCertificate, hostname: &str) -> bool {
    let Some(host) = normalize_dns_name(hostname) else {
        return false;
    };
    cert.candidate_names()
        .into_iter()
        .any(|pattern| matches_name(pattern, &host))
}

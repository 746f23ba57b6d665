//! Platform default locations of the system CA bundle.
//!
//! Resolved once at startup and passed to the trust store as a plain path.

use std::path::{Path, PathBuf};

use crate::error_handling::ConfigurationError;

/// Debian/Ubuntu/Alpine/Arch bundle
pub const LINUX_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";
/// Fedora/RHEL bundle, used when the Debian path is absent
pub const LINUX_CA_BUNDLE_RHEL: &str = "/etc/pki/tls/certs/ca-bundle.crt";
/// macOS bundle
pub const MACOS_CA_BUNDLE: &str = "/etc/ssl/cert.pem";
/// FreeBSD bundle
pub const FREEBSD_CA_BUNDLE: &str = "/usr/local/share/certs/ca-root-nss.crt";

/// Candidate bundle paths for an operating system family, in preference order.
pub fn ca_bundle_candidates(os: &str) -> &'static [&'static str] {
    match os {
        "linux" => &[LINUX_CA_BUNDLE, LINUX_CA_BUNDLE_RHEL],
        "macos" => &[MACOS_CA_BUNDLE],
        "freebsd" => &[FREEBSD_CA_BUNDLE],
        _ => &[],
    }
}

/// Resolves the CA bundle path for this run.
///
/// An explicit path always wins. Otherwise the first existing candidate for
/// the current platform is used; if none exists the first candidate is
/// returned so the trust store reports the missing file.
pub fn resolve_ca_bundle(explicit: Option<&Path>) -> Result<PathBuf, ConfigurationError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let candidates = ca_bundle_candidates(std::env::consts::OS);
    let first = candidates
        .first()
        .ok_or(ConfigurationError::NoDefaultCaBundle)?;
    let path = candidates
        .iter()
        .find(|p| Path::new(p).exists())
        .unwrap_or(first);
    Ok(PathBuf::from(path))
}

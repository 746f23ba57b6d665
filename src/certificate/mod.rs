//! Certificate model.
//!
//! This module turns a fetched certificate into a read-only set of fields:
//! - Issuer and subject distinguished-name attributes
//! - Serial number
//! - Validity window (UTC)
//! - Subject alternative DNS names
//!
//! Two input shapes are supported behind the `CertificateSource` trait: raw
//! DER bytes (parsed with `x509-parser`) and the peer-certificate dictionary
//! shape returned by lightweight TLS introspection APIs. Both produce the same
//! `ParsedCertificate`.

mod der;
mod hostname;
mod peer_dict;

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use serde::Serialize;

use crate::error_handling::ParseError;
use crate::tls::FetchedCertificate;

pub(crate) use der::is_self_issued;
pub use hostname::{matches_hostname, to_ascii_hostname};
pub use peer_dict::{parse_peer_timestamp, PeerCertificateDict};

/// Distinguished-name attributes we report on.
///
/// Each field holds the first occurrence of its attribute; an attribute that
/// is missing or not representable as a string is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    /// countryName (C)
    pub country: Option<String>,
    /// stateOrProvinceName (ST)
    pub state_or_province: Option<String>,
    /// localityName (L)
    pub locality: Option<String>,
    /// organizationName (O)
    pub organization: Option<String>,
    /// organizationalUnitName (OU)
    pub organizational_unit: Option<String>,
    /// commonName (CN)
    pub common_name: Option<String>,
}

/// Parsed view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCertificate {
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
    /// Uppercase hex, no separators, without the DER sign-padding byte
    pub serial_number: Option<String>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    /// DNS entries of the subjectAltName extension, in certificate order
    pub subject_alt_names: Vec<String>,
    /// Whether the subjectAltName extension is present at all.
    ///
    /// When it is, the subject common name is ignored for hostname matching
    /// even if the extension carries no DNS entries.
    pub san_present: bool,
}

impl ParsedCertificate {
    /// Returns true when both bounds are known and `not_after < not_before`.
    ///
    /// Such a certificate is reported as-is; nothing here reorders the bounds.
    pub fn validity_anomaly(&self) -> bool {
        matches!((self.not_before, self.not_after), (Some(nb), Some(na)) if na < nb)
    }

    /// Returns true when `now` is past `not_after`.
    pub fn has_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after.is_some_and(|na| now > na)
    }

    /// Returns true when the certificate covers `hostname`.
    pub fn matches_hostname(&self, hostname: &str) -> bool {
        matches_hostname(self, hostname)
    }

    /// Names considered for hostname matching.
    ///
    /// SAN DNS entries when the extension is present, otherwise the subject
    /// common name.
    pub fn candidate_names(&self) -> Vec<&str> {
        if self.san_present {
            self.subject_alt_names.iter().map(String::as_str).collect()
        } else {
            self.subject.common_name.as_deref().into_iter().collect()
        }
    }
}

/// Something a `ParsedCertificate` can be built from.
pub trait CertificateSource {
    /// Extracts the certificate fields.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` when the input cannot be read as a certificate at
    /// all. Missing individual fields are reported as absent, not as errors.
    fn parse_certificate(&self) -> Result<ParsedCertificate, ParseError>;
}

impl CertificateSource for CertificateDer<'_> {
    fn parse_certificate(&self) -> Result<ParsedCertificate, ParseError> {
        der::parse_der(self.as_ref())
    }
}

impl CertificateSource for FetchedCertificate {
    fn parse_certificate(&self) -> Result<ParsedCertificate, ParseError> {
        self.leaf().parse_certificate()
    }
}

impl CertificateSource for PeerCertificateDict {
    fn parse_certificate(&self) -> Result<ParsedCertificate, ParseError> {
        peer_dict::parse_dict(self)
    }
}

/// Parses any supported certificate input.
pub fn parse<S: CertificateSource + ?Sized>(source: &S) -> Result<ParsedCertificate, ParseError> {
    source.parse_certificate()
}

/// Renders serial bytes as uppercase hex, dropping leading zero padding.
///
/// A serial of all zero bytes renders as `"0"`.
pub(crate) fn format_serial(bytes: &[u8]) -> String {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let significant = &bytes[start..];
    if significant.is_empty() {
        return "0".to_string();
    }
    significant.iter().map(|b| format!("{b:02X}")).collect()
}

/// Normalizes a hex serial string to the `format_serial` rendering.
pub(crate) fn normalize_serial(serial: &str) -> String {
    let cleaned: String = serial
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let trimmed = cleaned.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else if trimmed.len() % 2 == 1 {
        format!("0{trimmed}")
    } else {
        trimmed.to_string()
    }
}

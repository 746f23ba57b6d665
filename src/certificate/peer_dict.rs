//! Peer-certificate dictionary adapter.
//!
//! Lightweight TLS introspection APIs describe the peer certificate as a
//! dictionary instead of DER:
//!
//! ```json
//! {
//!   "issuer": [[["countryName", "US"]], [["organizationName", "DigiCert Inc"]]],
//!   "subject": [[["commonName", "www.python.org"]]],
//!   "serialNumber": "0A0BEEEAB294FC6DFA6E556CBB94BA07",
//!   "notBefore": "Sep 29 00:00:00 2020 GMT",
//!   "notAfter": "Oct 31 00:00:00 2021 GMT",
//!   "subjectAltName": [["DNS", "www.python.org"], ["DNS", "python.org"]]
//! }
//! ```
//!
//! Unknown keys (`OCSP`, `caIssuers`, `crlDistributionPoints`, ...) are ignored.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use super::{normalize_serial, DistinguishedName, ParsedCertificate};
use crate::error_handling::ParseError;

const PEER_TIME_FORMAT: &str = "%b %d %H:%M:%S %Y GMT";

/// A relative distinguished name: one or more `(attribute, value)` pairs.
pub type RelativeName = Vec<(String, String)>;

/// Peer certificate in dictionary form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerCertificateDict {
    #[serde(default)]
    pub issuer: Vec<RelativeName>,
    #[serde(default)]
    pub subject: Vec<RelativeName>,
    #[serde(rename = "serialNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(rename = "notBefore", default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(rename = "notAfter", default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
    /// `(type, value)` pairs such as `("DNS", "example.com")`
    #[serde(rename = "subjectAltName", default, skip_serializing_if = "Option::is_none")]
    pub subject_alt_name: Option<Vec<(String, String)>>,
}

/// Parses a dictionary timestamp such as `"Oct 31 00:00:00 2021 GMT"`.
///
/// Runs of whitespace are collapsed first, so the space-padded day form
/// (`"Sep  9 ..."`) is accepted too.
pub fn parse_peer_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, PEER_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ParseError::InvalidTimestamp(value.to_string()))
}

fn timestamp_field(field: &'static str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    match parse_peer_timestamp(value) {
        Ok(ts) => Some(ts),
        Err(_) => {
            warn!("Ignoring unparsable {field} timestamp {value:?}");
            None
        }
    }
}

fn distinguished_name(rdns: &[RelativeName]) -> DistinguishedName {
    let attribute = |key: &str| {
        rdns.iter()
            .flatten()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    };
    DistinguishedName {
        country: attribute("countryName"),
        state_or_province: attribute("stateOrProvinceName"),
        locality: attribute("localityName"),
        organization: attribute("organizationName"),
        organizational_unit: attribute("organizationalUnitName"),
        common_name: attribute("commonName"),
    }
}

pub(super) fn parse_dict(dict: &PeerCertificateDict) -> Result<ParsedCertificate, ParseError> {
    let subject_alt_names = dict
        .subject_alt_name
        .iter()
        .flatten()
        .filter(|(kind, _)| kind == "DNS")
        .map(|(_, name)| name.clone())
        .collect();

    Ok(ParsedCertificate {
        issuer: distinguished_name(&dict.issuer),
        subject: distinguished_name(&dict.subject),
        serial_number: dict.serial_number.as_deref().map(normalize_serial),
        not_before: timestamp_field("notBefore", dict.not_before.as_deref()),
        not_after: timestamp_field("notAfter", dict.not_after.as_deref()),
        subject_alt_names,
        san_present: dict.subject_alt_name.is_some(),
    })
}

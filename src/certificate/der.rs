//! DER adapter built on `x509-parser`.

use chrono::{DateTime, Utc};
use log::debug;
use x509_parser::prelude::*;

use super::{format_serial, DistinguishedName, ParsedCertificate};
use crate::error_handling::ParseError;

pub(super) fn parse_der(der: &[u8]) -> Result<ParsedCertificate, ParseError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| ParseError::MalformedCertificate(e.to_string()))?;

    let (san_present, subject_alt_names) = extract_certificate_sans(&cert);

    Ok(ParsedCertificate {
        issuer: distinguished_name(cert.issuer()),
        subject: distinguished_name(cert.subject()),
        serial_number: Some(format_serial(cert.raw_serial())),
        not_before: to_utc(cert.validity().not_before),
        not_after: to_utc(cert.validity().not_after),
        subject_alt_names,
        san_present,
    })
}

/// Returns true when the certificate names itself as its issuer.
///
/// Unparsable input is not self-issued.
pub(crate) fn is_self_issued(der: &[u8]) -> bool {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert.issuer().as_raw() == cert.subject().as_raw())
        .unwrap_or(false)
}

/// UTCTime and GeneralizedTime both decode to `ASN1Time`, so one conversion
/// covers either encoding.
fn to_utc(time: ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

fn first<'a, 'b: 'a>(
    mut attrs: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>,
) -> Option<String> {
    attrs
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}

fn distinguished_name(name: &X509Name<'_>) -> DistinguishedName {
    DistinguishedName {
        country: first(name.iter_country()),
        state_or_province: first(name.iter_state_or_province()),
        locality: first(name.iter_locality()),
        organization: first(name.iter_organization()),
        organizational_unit: first(name.iter_organizational_unit()),
        common_name: first(name.iter_common_name()),
    }
}

/// Extracts DNS entries from the Subject Alternative Name extension.
///
/// Returns whether the extension is present along with its DNS names. Other
/// name types (IP addresses, email addresses, URIs) are ignored. A SAN
/// extension that fails to decode counts as present with no names, so the
/// common name is never used as a fallback for it.
fn extract_certificate_sans(cert: &X509Certificate<'_>) -> (bool, Vec<String>) {
    match cert.subject_alternative_name() {
        Ok(Some(san)) => {
            let names = san
                .value
                .general_names
                .iter()
                .filter_map(|general_name| match general_name {
                    GeneralName::DNSName(dns_name) => Some(dns_name.to_string()),
                    _ => None,
                })
                .collect();
            (true, names)
        }
        Ok(None) => (false, Vec::new()),
        Err(e) => {
            debug!("Unreadable subjectAltName extension: {e}");
            (true, Vec::new())
        }
    }
}

//! Chain validation.
//!
//! Runs X.509 path building over a fetched chain, separately from the
//! handshake that retrieved it. Hostname checks are never part of this step,
//! and by default neither is the wall clock: see `ValidationTime`.
//!
//! An untrusted or broken chain is a normal negative `ValidationResult`, not
//! an error.

mod trust_store;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::UnixTime;
use rustls::CertificateError;
use serde::Serialize;
use thiserror::Error;

use crate::certificate::{self, is_self_issued};
use crate::tls::FetchedCertificate;

pub use trust_store::TrustStore;

/// The moment a chain is validated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationTime {
    /// Now, clamped into the leaf's own validity window.
    ///
    /// Trust in the issuing path is judged independently of whether the leaf
    /// has expired; expiry is a separate check.
    #[default]
    WithinLeafValidity,
    /// Now. An expired or not-yet-valid certificate anywhere on the path makes
    /// the chain untrusted.
    Current,
}

/// Why a chain was not trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationFailure {
    /// No path to a trusted root could be built.
    #[error("certificate chain does not lead to a trusted root")]
    UntrustedRoot,
    /// The leaf is self-signed and not itself trusted.
    #[error("self-signed certificate")]
    SelfSigned,
    /// A signature on the path does not verify.
    #[error("certificate signature is invalid")]
    BadSignature,
    /// A certificate on the path has expired at the validation time.
    #[error("a certificate in the chain has expired")]
    Expired,
    /// A certificate on the path is not yet valid at the validation time.
    #[error("a certificate in the chain is not yet valid")]
    NotYetValid,
    /// The leaf is not usable for TLS server authentication.
    #[error("certificate is not valid for server authentication")]
    InvalidPurpose,
    /// A certificate on the path has been revoked.
    #[error("certificate has been revoked")]
    Revoked,
    /// A certificate on the path could not be decoded.
    #[error("malformed certificate: {0}")]
    Malformed(String),
    /// Anything else rustls reports (path length, unsupported algorithm, ...).
    #[error("{0}")]
    Other(String),
}

/// Outcome of chain validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub trusted: bool,
    pub failure: Option<ValidationFailure>,
}

impl ValidationResult {
    fn trusted() -> Self {
        Self {
            trusted: true,
            failure: None,
        }
    }

    fn untrusted(failure: ValidationFailure) -> Self {
        Self {
            trusted: false,
            failure: Some(failure),
        }
    }
}

/// Validates fetched chains against a trust store.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    trust_store: TrustStore,
    provider: Arc<CryptoProvider>,
    time: ValidationTime,
}

impl ChainValidator {
    pub fn new(trust_store: TrustStore, provider: Arc<CryptoProvider>, time: ValidationTime) -> Self {
        Self {
            trust_store,
            provider,
            time,
        }
    }

    pub fn trust_store(&self) -> &TrustStore {
        &self.trust_store
    }

    /// Validates `fetched` at the current time.
    pub fn verify(&self, fetched: &FetchedCertificate) -> ValidationResult {
        self.verify_at(fetched, Utc::now())
    }

    /// Validates `fetched` as if the current time were `now`.
    pub fn verify_at(&self, fetched: &FetchedCertificate, now: DateTime<Utc>) -> ValidationResult {
        let leaf = match rustls::server::ParsedCertificate::try_from(fetched.leaf()) {
            Ok(leaf) => leaf,
            Err(e) => return ValidationResult::untrusted(ValidationFailure::Malformed(e.to_string())),
        };

        let at = match self.time {
            ValidationTime::Current => now,
            ValidationTime::WithinLeafValidity => match certificate::parse(fetched) {
                Ok(parsed) => clamp(now, parsed.not_before, parsed.not_after),
                Err(e) => return ValidationResult::untrusted(ValidationFailure::Malformed(e.to_string())),
            },
        };
        debug!("Validating chain of {} certificate(s) at {at}", fetched.chain().len());

        let result = verify_server_cert_signed_by_trust_anchor(
            &leaf,
            self.trust_store.roots(),
            fetched.intermediates(),
            to_unix_time(at),
            self.provider.signature_verification_algorithms.all,
        );

        match result {
            Ok(()) => ValidationResult::trusted(),
            Err(rustls::Error::InvalidCertificate(error)) => {
                ValidationResult::untrusted(classify(error, fetched))
            }
            Err(error) => ValidationResult::untrusted(ValidationFailure::Other(error.to_string())),
        }
    }
}

fn classify(error: CertificateError, fetched: &FetchedCertificate) -> ValidationFailure {
    match error {
        CertificateError::UnknownIssuer if is_self_issued(fetched.leaf()) => {
            ValidationFailure::SelfSigned
        }
        CertificateError::UnknownIssuer => ValidationFailure::UntrustedRoot,
        CertificateError::BadSignature => ValidationFailure::BadSignature,
        CertificateError::Expired | CertificateError::ExpiredContext { .. } => {
            ValidationFailure::Expired
        }
        CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => {
            ValidationFailure::NotYetValid
        }
        CertificateError::InvalidPurpose | CertificateError::InvalidPurposeContext { .. } => {
            ValidationFailure::InvalidPurpose
        }
        CertificateError::Revoked => ValidationFailure::Revoked,
        CertificateError::BadEncoding => ValidationFailure::Malformed("bad encoding".to_string()),
        other => ValidationFailure::Other(format!("{other:?}")),
    }
}

/// Clamps `now` into `[not_before, not_after]`; missing bounds do not clamp.
fn clamp(
    now: DateTime<Utc>,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match (not_before, not_after) {
        (_, Some(na)) if now > na => na,
        (Some(nb), _) if now < nb => nb,
        _ => now,
    }
}

fn to_unix_time(at: DateTime<Utc>) -> UnixTime {
    UnixTime::since_unix_epoch(Duration::from_secs(at.timestamp().max(0).unsigned_abs()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
    use rustls::pki_types::CertificateDer;

    use super::*;

    struct Ca {
        cert: rcgen::Certificate,
        key: KeyPair,
    }

    fn ca(name: &str) -> Ca {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        Ca { cert, key }
    }

    fn leaf(issuer: &Ca, from: (i32, u8, u8), to: (i32, u8, u8)) -> CertificateDer<'static> {
        let mut params = CertificateParams::new(vec!["leaf.test".to_string()]).unwrap();
        params.not_before = rcgen::date_time_ymd(from.0, from.1, from.2);
        params.not_after = rcgen::date_time_ymd(to.0, to.1, to.2);
        let key = KeyPair::generate().unwrap();
        params
            .signed_by(&key, &issuer.cert, &issuer.key)
            .unwrap()
            .der()
            .clone()
    }

    fn validator(roots: &[&Ca], time: ValidationTime) -> ChainValidator {
        let store = TrustStore::from_certificates(roots.iter().map(|ca| ca.cert.der().clone()));
        ChainValidator::new(
            store,
            Arc::new(rustls::crypto::ring::default_provider()),
            time,
        )
    }

    fn fetched(chain: Vec<CertificateDer<'static>>) -> FetchedCertificate {
        FetchedCertificate::from_chain(chain).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_trusted_chain() {
        let root = ca("Test Root");
        let chain = fetched(vec![leaf(&root, (2024, 1, 1), (2025, 1, 1))]);

        let result = validator(&[&root], ValidationTime::Current).verify_at(&chain, at(2024, 6, 1));
        assert!(result.trusted, "{result:?}");
        assert!(result.failure.is_none());
    }

    #[test]
    fn test_untrusted_root() {
        let root = ca("Test Root");
        let other = ca("Other Root");
        let chain = fetched(vec![leaf(&root, (2024, 1, 1), (2025, 1, 1))]);

        let result = validator(&[&other], ValidationTime::Current).verify_at(&chain, at(2024, 6, 1));
        assert!(!result.trusted);
        assert_eq!(result.failure, Some(ValidationFailure::UntrustedRoot));
    }

    #[test]
    fn test_self_signed_leaf() {
        let mut params = CertificateParams::new(vec!["self.test".to_string()]).unwrap();
        params.distinguished_name.push(rcgen::DnType::CommonName, "self.test");
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        let chain = fetched(vec![cert.der().clone()]);

        let result = validator(&[&ca("Test Root")], ValidationTime::WithinLeafValidity).verify(&chain);
        assert!(!result.trusted);
        assert_eq!(result.failure, Some(ValidationFailure::SelfSigned));
    }

    #[test]
    fn test_expired_leaf_trusted_within_leaf_validity() {
        let root = ca("Test Root");
        let chain = fetched(vec![leaf(&root, (2020, 1, 1), (2021, 1, 1))]);

        let result =
            validator(&[&root], ValidationTime::WithinLeafValidity).verify_at(&chain, at(2024, 6, 1));
        assert!(result.trusted, "{result:?}");

        let result = validator(&[&root], ValidationTime::Current).verify_at(&chain, at(2024, 6, 1));
        assert!(!result.trusted);
        assert_eq!(result.failure, Some(ValidationFailure::Expired));
    }

    #[test]
    fn test_not_yet_valid_leaf() {
        let root = ca("Test Root");
        let chain = fetched(vec![leaf(&root, (2030, 1, 1), (2031, 1, 1))]);

        let result = validator(&[&root], ValidationTime::Current).verify_at(&chain, at(2024, 6, 1));
        assert_eq!(result.failure, Some(ValidationFailure::NotYetValid));

        let result =
            validator(&[&root], ValidationTime::WithinLeafValidity).verify_at(&chain, at(2024, 6, 1));
        assert!(result.trusted, "{result:?}");
    }

    #[test]
    fn test_untrusted_regardless_of_leaf_expiry() {
        let root = ca("Test Root");
        let stranger = ca("Stranger");
        let expired = fetched(vec![leaf(&root, (2020, 1, 1), (2021, 1, 1))]);
        let current = fetched(vec![leaf(&root, (2024, 1, 1), (2025, 1, 1))]);

        for time in [ValidationTime::WithinLeafValidity, ValidationTime::Current] {
            let validator = validator(&[&stranger], time);
            for when in [at(2020, 6, 1), at(2024, 6, 1), at(2030, 6, 1)] {
                assert!(!validator.verify_at(&expired, when).trusted);
                assert!(!validator.verify_at(&current, when).trusted);
            }
        }
    }

    #[test]
    fn test_intermediate_completes_the_path() {
        let root = ca("Test Root");
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Test Intermediate");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let key = KeyPair::generate().unwrap();
        let intermediate = Ca {
            cert: params.signed_by(&key, &root.cert, &root.key).unwrap(),
            key,
        };
        let leaf = leaf(&intermediate, (2024, 1, 1), (2025, 1, 1));
        let validator = validator(&[&root], ValidationTime::Current);

        let with = fetched(vec![leaf.clone(), intermediate.cert.der().clone()]);
        assert!(validator.verify_at(&with, at(2024, 6, 1)).trusted);

        let without = fetched(vec![leaf]);
        assert_eq!(
            validator.verify_at(&without, at(2024, 6, 1)).failure,
            Some(ValidationFailure::UntrustedRoot)
        );
    }

    #[test]
    fn test_garbage_leaf_is_malformed() {
        let chain = fetched(vec![CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00])]);
        let result = validator(&[], ValidationTime::WithinLeafValidity).verify(&chain);
        assert!(!result.trusted);
        assert!(matches!(result.failure, Some(ValidationFailure::Malformed(_))));
    }

    #[test]
    fn test_clamp() {
        let nb = Some(at(2024, 1, 1));
        let na = Some(at(2025, 1, 1));
        assert_eq!(clamp(at(2023, 1, 1), nb, na), at(2024, 1, 1));
        assert_eq!(clamp(at(2026, 1, 1), nb, na), at(2025, 1, 1));
        assert_eq!(clamp(at(2024, 6, 1), nb, na), at(2024, 6, 1));
        assert_eq!(clamp(at(2026, 1, 1), None, None), at(2026, 1, 1));
    }
}

//! Certificate check evaluation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::{Assertion, AssertionKind, AssertionStatus, CheckKind, CheckReport};
use crate::certificate::{self, ParsedCertificate};
use crate::config::CertificateCheckSpec;
use crate::error_handling::{CheckError, FetchError};
use crate::tls::{CertificateFetcher, Endpoint, FetchedCertificate};
use crate::validation::ChainValidator;

/// Fetches the certificate for `spec.site` and evaluates every assertion.
///
/// Only infrastructure failures (fetch, parse) are returned as errors;
/// unmet expectations are `Failed` assertions in the report.
pub async fn run_certificate_check<F: CertificateFetcher>(
    spec: &CertificateCheckSpec,
    fetcher: &F,
    validator: &ChainValidator,
    fetch_timeout: Duration,
    now: DateTime<Utc>,
) -> Result<CheckReport, CheckError> {
    let endpoint = Endpoint::from_site(&spec.site)
        .map_err(|reason| FetchError::InvalidServerName {
            host: spec.site.clone(),
            reason,
        })?
        .with_timeout(fetch_timeout);

    let fetched = fetcher.fetch(&endpoint).await?;
    let parsed = certificate::parse(&fetched)?;
    debug!(
        "Fetched certificate for {endpoint}: subject CN {:?}, {} SAN name(s)",
        parsed.subject.common_name,
        parsed.subject_alt_names.len()
    );

    Ok(CheckReport::new(
        CheckKind::Certificate,
        spec.site.as_str(),
        evaluate_certificate(spec, &fetched, &parsed, validator, now),
    ))
}

/// Evaluates the assertions of a certificate check, in report order.
pub fn evaluate_certificate(
    spec: &CertificateCheckSpec,
    fetched: &FetchedCertificate,
    parsed: &ParsedCertificate,
    validator: &ChainValidator,
    now: DateTime<Utc>,
) -> Vec<Assertion> {
    vec![
        Assertion::new(AssertionKind::Expiry, expiry(spec, parsed, now)),
        Assertion::new(AssertionKind::Issuer, issuer(spec, parsed)),
        Assertion::new(AssertionKind::SiteMatch, site_match(spec, parsed)),
        Assertion::new(AssertionKind::Trust, trust(spec, fetched, validator, now)),
    ]
}

fn expiry(spec: &CertificateCheckSpec, parsed: &ParsedCertificate, now: DateTime<Utc>) -> AssertionStatus {
    let thresholds = spec.thresholds();
    if !thresholds.is_unset() && parsed.validity_anomaly() {
        warn!(
            "Certificate for {} has notAfter before notBefore ({:?} < {:?})",
            spec.site, parsed.not_after, parsed.not_before
        );
        return AssertionStatus::Errored("certificate notAfter precedes notBefore".to_string());
    }
    thresholds.evaluate(parsed.not_before, parsed.not_after, now)
}

fn issuer(spec: &CertificateCheckSpec, parsed: &ParsedCertificate) -> AssertionStatus {
    let Some(expected) = spec.expected_issuer_organisation_name.as_deref() else {
        return AssertionStatus::Skipped("no expected issuer configured".to_string());
    };
    let Some(actual) = parsed.issuer.organization.as_deref() else {
        return AssertionStatus::Skipped("certificate issuer has no organization name".to_string());
    };
    if actual.to_lowercase() == expected.to_lowercase() {
        AssertionStatus::Passed
    } else {
        AssertionStatus::Failed(format!("issuer organization is {actual:?}, expected {expected:?}"))
    }
}

fn site_match(spec: &CertificateCheckSpec, parsed: &ParsedCertificate) -> AssertionStatus {
    let unmatched: Vec<&str> = spec
        .all_sites()
        .filter(|site| match Endpoint::from_site(site) {
            Ok(endpoint) => !parsed.matches_hostname(&endpoint.hostname),
            Err(_) => true,
        })
        .collect();

    if unmatched.is_empty() {
        AssertionStatus::Passed
    } else {
        AssertionStatus::Failed(format!(
            "certificate is not valid for {} (names: {})",
            unmatched.join(", "),
            parsed.candidate_names().join(", ")
        ))
    }
}

fn trust(
    spec: &CertificateCheckSpec,
    fetched: &FetchedCertificate,
    validator: &ChainValidator,
    now: DateTime<Utc>,
) -> AssertionStatus {
    if !spec.verify_chain {
        return AssertionStatus::Skipped("chain verification disabled".to_string());
    }
    let result = validator.verify_at(fetched, now);
    match result.failure {
        None if result.trusted => AssertionStatus::Passed,
        Some(failure) => AssertionStatus::Failed(failure.to_string()),
        None => AssertionStatus::Failed("certificate chain is not trusted".to_string()),
    }
}

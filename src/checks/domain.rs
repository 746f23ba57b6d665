//! Domain registration check evaluation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::debug;

use super::{Assertion, AssertionKind, AssertionStatus, CheckKind, CheckReport};
use crate::config::DomainCheckSpec;
use crate::error_handling::CheckError;
use crate::whois::{WhoisLookup, WhoisRecord};

/// Looks up `spec.domain` and evaluates every assertion.
///
/// A check with no expectations at all never queries whois.
pub async fn run_domain_check<W: WhoisLookup>(
    spec: &DomainCheckSpec,
    whois: &W,
    now: DateTime<Utc>,
) -> Result<CheckReport, CheckError> {
    let record = if has_expectations(spec) {
        whois.lookup(&spec.domain).await?
    } else {
        debug!("No expectations for {}, skipping whois lookup", spec.domain);
        WhoisRecord::default()
    };

    Ok(CheckReport::new(
        CheckKind::Domain,
        spec.domain.as_str(),
        evaluate_domain(spec, &record, now),
    ))
}

fn has_expectations(spec: &DomainCheckSpec) -> bool {
    !spec.thresholds().is_unset()
        || spec.expected_registrar_name.is_some()
        || spec.expected_name_servers.is_some()
}

/// Evaluates the assertions of a domain check, in report order.
pub fn evaluate_domain(spec: &DomainCheckSpec, record: &WhoisRecord, now: DateTime<Utc>) -> Vec<Assertion> {
    let expiry = spec
        .thresholds()
        .evaluate(record.creation_date, record.expiration_date, now);
    vec![
        Assertion::new(AssertionKind::Expiry, expiry),
        Assertion::new(AssertionKind::Registrar, registrar(spec, record)),
        Assertion::new(AssertionKind::NameServers, name_servers(spec, record)),
    ]
}

fn registrar(spec: &DomainCheckSpec, record: &WhoisRecord) -> AssertionStatus {
    let Some(expected) = spec.expected_registrar_name.as_deref() else {
        return AssertionStatus::Skipped("no expected registrar configured".to_string());
    };
    let Some(actual) = record.registrar.as_deref() else {
        return AssertionStatus::Skipped("whois record has no registrar".to_string());
    };
    if actual.trim().to_lowercase() == expected.trim().to_lowercase() {
        AssertionStatus::Passed
    } else {
        AssertionStatus::Failed(format!("registrar is {actual:?}, expected {expected:?}"))
    }
}

fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

fn name_servers(spec: &DomainCheckSpec, record: &WhoisRecord) -> AssertionStatus {
    let Some(expected) = spec.expected_name_servers.as_ref() else {
        return AssertionStatus::Skipped("no expected name servers configured".to_string());
    };
    let expected: BTreeSet<String> = expected.iter().map(|n| normalize(n)).collect();
    let actual: BTreeSet<String> = record.name_servers.iter().map(|n| normalize(n)).collect();
    if expected == actual {
        return AssertionStatus::Passed;
    }

    let mut problems = Vec::new();
    let missing: Vec<&str> = expected.difference(&actual).map(String::as_str).collect();
    if !missing.is_empty() {
        problems.push(format!("missing {}", missing.join(", ")));
    }
    let unexpected: Vec<&str> = actual.difference(&expected).map(String::as_str).collect();
    if !unexpected.is_empty() {
        problems.push(format!("unexpected {}", unexpected.join(", ")));
    }
    AssertionStatus::Failed(format!("name servers differ: {}", problems.join("; ")))
}

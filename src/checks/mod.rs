//! Check evaluation.
//!
//! A certificate check fetches a site's certificate and evaluates expiry,
//! issuer, hostname coverage and chain trust. A domain check looks up the
//! registration record and evaluates expiry, registrar and name servers.
//! Every assertion whose expectation is unset is `Skipped`.

mod certificate;
mod domain;
mod expiry;
mod report;

pub use certificate::{evaluate_certificate, run_certificate_check};
pub use domain::{evaluate_domain, run_domain_check};
pub use expiry::ExpiryThresholds;
pub use report::{Assertion, AssertionKind, AssertionStatus, CheckKind, CheckOutcome, CheckReport};

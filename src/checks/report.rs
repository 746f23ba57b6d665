//! Assertion and per-check report types.

use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// Result of a single assertion.
///
/// `Failed` means the check was evaluated and did not meet its expectation.
/// `Errored` means it could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AssertionStatus {
    Passed,
    Failed(String),
    Skipped(String),
    Errored(String),
}

impl AssertionStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, AssertionStatus::Passed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AssertionStatus::Passed => None,
            AssertionStatus::Failed(r) | AssertionStatus::Skipped(r) | AssertionStatus::Errored(r) => {
                Some(r)
            }
        }
    }
}

/// What an assertion looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssertionKind {
    /// Retrieving the certificate
    Fetch,
    /// Decoding the retrieved certificate
    Certificate,
    /// Retrieving the registration record
    Whois,
    /// The check as a whole (timeouts)
    Processing,
    Expiry,
    Issuer,
    SiteMatch,
    Trust,
    Registrar,
    NameServers,
}

/// One evaluated assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub kind: AssertionKind,
    #[serde(flatten)]
    pub status: AssertionStatus,
}

impl Assertion {
    pub fn new(kind: AssertionKind, status: AssertionStatus) -> Self {
        Self { kind, status }
    }
}

/// Which list of the check document a check came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    Certificate,
    Domain,
}

/// Overall outcome of a check, from its assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckOutcome {
    Skipped,
    Passed,
    Failed,
    Errored,
}

/// Ordered assertions for one configured check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub kind: CheckKind,
    /// Site or domain as written in the check document
    pub target: String,
    pub outcome: CheckOutcome,
    pub assertions: Vec<Assertion>,
}

impl CheckReport {
    pub fn new(kind: CheckKind, target: impl Into<String>, assertions: Vec<Assertion>) -> Self {
        let outcome = outcome_of(&assertions);
        Self {
            kind,
            target: target.into(),
            outcome,
            assertions,
        }
    }

    /// A report for a check that could not be evaluated.
    pub fn errored(
        kind: CheckKind,
        target: impl Into<String>,
        assertion: AssertionKind,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            kind,
            target,
            vec![Assertion::new(assertion, AssertionStatus::Errored(reason.into()))],
        )
    }

    pub fn assertion(&self, kind: AssertionKind) -> Option<&AssertionStatus> {
        self.assertions
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| &a.status)
    }
}

/// Errored beats failed, failed beats passed; all-skipped is skipped.
fn outcome_of(assertions: &[Assertion]) -> CheckOutcome {
    let mut outcome = CheckOutcome::Skipped;
    for assertion in assertions {
        let this = match assertion.status {
            AssertionStatus::Passed => CheckOutcome::Passed,
            AssertionStatus::Skipped(_) => CheckOutcome::Skipped,
            AssertionStatus::Failed(_) => CheckOutcome::Failed,
            AssertionStatus::Errored(_) => CheckOutcome::Errored,
        };
        outcome = outcome.max(this);
    }
    outcome
}

//! Per-check task processing.
//!
//! Runs one configured check under the per-check timeout and turns any
//! infrastructure error into an errored report.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, warn};

use crate::checks::{
    run_certificate_check, run_domain_check, AssertionKind, CheckKind, CheckReport,
};
use crate::config::{CertificateCheckSpec, DomainCheckSpec};
use crate::error_handling::{CheckError, ProcessingStats};
use crate::tls::CertificateFetcher;
use crate::whois::WhoisLookup;

use super::CheckContext;

/// One entry of the check document.
#[derive(Debug, Clone)]
pub enum CheckTask {
    Certificate(CertificateCheckSpec),
    Domain(DomainCheckSpec),
}

impl CheckTask {
    pub fn kind(&self) -> CheckKind {
        match self {
            CheckTask::Certificate(_) => CheckKind::Certificate,
            CheckTask::Domain(_) => CheckKind::Domain,
        }
    }

    /// Site or domain, as written in the check document.
    pub fn target(&self) -> &str {
        match self {
            CheckTask::Certificate(spec) => &spec.site,
            CheckTask::Domain(spec) => &spec.domain,
        }
    }
}

/// Process a single check.
///
/// Never fails: fetch, parse and whois errors, and running past the
/// processing timeout, all become a report with one errored assertion.
pub async fn process_check_task<F, W>(task: CheckTask, ctx: Arc<CheckContext<F, W>>) -> CheckReport
where
    F: CertificateFetcher,
    W: WhoisLookup,
{
    let started = Instant::now();
    let check_timeout = ctx.options.check_timeout;

    let evaluation = async {
        let now = Utc::now();
        match &task {
            CheckTask::Certificate(spec) => {
                run_certificate_check(
                    spec,
                    &ctx.fetcher,
                    &ctx.validator,
                    ctx.options.fetch_timeout,
                    now,
                )
                .await
            }
            CheckTask::Domain(spec) => run_domain_check(spec, &ctx.whois, now).await,
        }
    };

    let result = match tokio::time::timeout(check_timeout, evaluation).await {
        Ok(result) => result,
        Err(_) => Err(CheckError::Timeout(check_timeout.as_secs())),
    };

    match result {
        Ok(report) => {
            debug!(
                "{} check {} finished as {} in {:.2}s",
                report.kind,
                report.target,
                report.outcome,
                started.elapsed().as_secs_f64()
            );
            report
        }
        Err(e) => handle_error(&task, e, &ctx.stats),
    }
}

/// Records an infrastructure error and builds the errored report.
fn handle_error(task: &CheckTask, error: CheckError, stats: &ProcessingStats) -> CheckReport {
    warn!("{} check {} could not be evaluated: {error}", task.kind(), task.target());
    stats.increment_error(error.kind());
    CheckReport::errored(task.kind(), task.target(), assertion_for(&error), error.to_string())
}

fn assertion_for(error: &CheckError) -> AssertionKind {
    match error {
        CheckError::Fetch(_) => AssertionKind::Fetch,
        CheckError::Parse(_) => AssertionKind::Certificate,
        CheckError::Whois(_) => AssertionKind::Whois,
        CheckError::Timeout(_) => AssertionKind::Processing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::{ErrorType, FetchError, ParseError, WhoisError};

    #[test]
    fn test_task_description() {
        let task = CheckTask::Certificate(CertificateCheckSpec::for_site("https://example.com/"));
        assert_eq!(task.kind(), CheckKind::Certificate);
        assert_eq!(task.target(), "https://example.com/");

        let task = CheckTask::Domain(DomainCheckSpec::for_domain("example.com"));
        assert_eq!(task.kind(), CheckKind::Domain);
        assert_eq!(task.target(), "example.com");
    }

    #[test]
    fn test_handle_error_records_kind() {
        let stats = ProcessingStats::new();
        let task = CheckTask::Domain(DomainCheckSpec::for_domain("example.com"));
        let report = handle_error(
            &task,
            CheckError::Whois(WhoisError::NoServer("example.com".into())),
            &stats,
        );
        assert_eq!(report.assertions.len(), 1);
        assert_eq!(report.assertions[0].kind, AssertionKind::Whois);
        assert_eq!(stats.get_error_count(ErrorType::WhoisLookup), 1);
    }

    #[test]
    fn test_assertion_for_error() {
        assert_eq!(
            assertion_for(&CheckError::Fetch(FetchError::NoCertificate {
                host: "a".into(),
                port: 443
            })),
            AssertionKind::Fetch
        );
        assert_eq!(
            assertion_for(&CheckError::Parse(ParseError::MalformedCertificate("x".into()))),
            AssertionKind::Certificate
        );
        assert_eq!(assertion_for(&CheckError::Timeout(60)), AssertionKind::Processing);
    }
}

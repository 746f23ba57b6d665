use colored::Colorize;

use super::OutputFormatter;
use crate::checks::{Assertion, AssertionStatus, CheckOutcome, CheckReport};
use crate::run::RunReport;

pub struct HumanFormatter {
    use_colors: bool,
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    fn success(&self, text: &str) -> String {
        if self.use_colors {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        if self.use_colors {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn error(&self, text: &str) -> String {
        if self.use_colors {
            text.magenta().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn muted(&self, text: &str) -> String {
        if self.use_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn header(&self, text: &str) -> String {
        if self.use_colors {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn outcome(&self, outcome: CheckOutcome) -> String {
        let text = outcome.to_string().to_uppercase();
        match outcome {
            CheckOutcome::Passed => self.success(&text),
            CheckOutcome::Failed => self.failure(&text),
            CheckOutcome::Errored => self.error(&text),
            CheckOutcome::Skipped => self.muted(&text),
        }
    }

    fn assertion(&self, assertion: &Assertion) -> String {
        let name = assertion.kind.to_string();
        match &assertion.status {
            AssertionStatus::Passed => format!("  {} {}", self.success("✓"), name),
            AssertionStatus::Failed(reason) => {
                format!("  {} {}: {}", self.failure("✗"), name, reason)
            }
            AssertionStatus::Errored(reason) => {
                format!("  {} {}: {}", self.error("!"), name, reason)
            }
            AssertionStatus::Skipped(reason) => {
                self.muted(&format!("  - {name}: {reason}"))
            }
        }
    }

    fn check(&self, report: &CheckReport) -> String {
        let mut output = vec![format!(
            "{} {}  {}",
            self.header(&report.kind.to_string()),
            report.target,
            self.outcome(report.outcome)
        )];
        output.extend(report.assertions.iter().map(|a| self.assertion(a)));
        output.join("\n")
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_run(&self, report: &RunReport) -> String {
        let mut output: Vec<String> = report.checks.iter().map(|c| self.check(c)).collect();

        let s = &report.summary;
        output.push(format!(
            "{} check{}: {} passed, {} failed, {} skipped, {} errored ({:.1}s)",
            s.total,
            if s.total == 1 { "" } else { "s" },
            self.success(&s.passed.to_string()),
            self.failure(&s.failed.to_string()),
            self.muted(&s.skipped.to_string()),
            self.error(&s.errored.to_string()),
            report.elapsed_seconds
        ));
        output.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{AssertionKind, CheckKind};
    use crate::run::RunSummary;

    fn sample() -> RunReport {
        let checks = vec![
            CheckReport::new(
                CheckKind::Certificate,
                "https://example.com/",
                vec![
                    Assertion::new(AssertionKind::Expiry, AssertionStatus::Passed),
                    Assertion::new(
                        AssertionKind::Issuer,
                        AssertionStatus::Skipped("no expected issuer configured".into()),
                    ),
                    Assertion::new(
                        AssertionKind::SiteMatch,
                        AssertionStatus::Failed("certificate is not valid for www.example.com".into()),
                    ),
                ],
            ),
            CheckReport::errored(
                CheckKind::Domain,
                "example.com",
                AssertionKind::Whois,
                "Whois query to whois.iana.org timed out",
            ),
        ];
        RunReport {
            summary: RunSummary::from_reports(&checks),
            checks,
            elapsed_seconds: 1.24,
            infrastructure_errors: Vec::new(),
        }
    }

    #[test]
    fn test_plain_rendering() {
        let out = HumanFormatter::new().without_colors().format_run(&sample());
        let expected = "\
certificate https://example.com/  FAILED
  ✓ expiry
  - issuer: no expected issuer configured
  ✗ site_match: certificate is not valid for www.example.com

domain example.com  ERRORED
  ! whois: Whois query to whois.iana.org timed out

2 checks: 0 passed, 1 failed, 0 skipped, 1 errored (1.2s)";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_run() {
        let report = RunReport {
            checks: Vec::new(),
            summary: RunSummary::default(),
            elapsed_seconds: 0.0,
            infrastructure_errors: Vec::new(),
        };
        let out = HumanFormatter::new().without_colors().format_run(&report);
        assert_eq!(out, "0 checks: 0 passed, 0 failed, 0 skipped, 0 errored (0.0s)");
    }
}

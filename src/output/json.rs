use super::OutputFormatter;
use crate::run::RunReport;

pub struct JsonFormatter {
    pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn to_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_run(&self, report: &RunReport) -> String {
        self.to_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Assertion, AssertionKind, AssertionStatus, CheckKind, CheckReport};
    use crate::run::RunSummary;

    fn sample() -> RunReport {
        let checks = vec![CheckReport::new(
            CheckKind::Certificate,
            "https://example.com/",
            vec![
                Assertion::new(AssertionKind::Expiry, AssertionStatus::Skipped("no threshold".into())),
                Assertion::new(AssertionKind::Trust, AssertionStatus::Failed("self-signed certificate".into())),
            ],
        )];
        RunReport {
            summary: RunSummary::from_reports(&checks),
            checks,
            elapsed_seconds: 0.25,
            infrastructure_errors: Vec::new(),
        }
    }

    #[test]
    fn test_compact_output_is_one_line() {
        let out = JsonFormatter::new().compact().format_run(&sample());
        assert!(!out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["checks"][0]["kind"], "certificate");
        assert_eq!(value["checks"][0]["assertions"][1]["kind"], "trust");
        assert_eq!(value["checks"][0]["assertions"][1]["status"], "failed");
        assert_eq!(
            value["checks"][0]["assertions"][1]["reason"],
            "self-signed certificate"
        );
    }

    #[test]
    fn test_pretty_output_parses() {
        let out = JsonFormatter::new().format_run(&sample());
        assert!(out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["checks"].as_array().map(Vec::len), Some(1));
    }
}

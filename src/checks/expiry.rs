//! Expiry threshold evaluation.
//!
//! Shared by certificate checks (validity window from the certificate) and
//! domain checks (registration window from whois).

use chrono::{DateTime, TimeDelta, Utc};

use super::AssertionStatus;

/// Configured warning windows before an expiry date.
///
/// Either, both or neither may be set. With both set the assertion fails as
/// soon as either window is entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryThresholds {
    /// Fail this many days before expiry
    pub days: Option<u32>,
    /// Fail when this percentage of the whole period remains
    pub percent: Option<u32>,
}

impl ExpiryThresholds {
    pub fn is_unset(&self) -> bool {
        self.days.is_none() && self.percent.is_none()
    }

    /// Evaluates the thresholds for a period running from `start` to `end`.
    ///
    /// `start` is only needed for the relative threshold and for reporting a
    /// period that has not begun yet.
    pub fn evaluate(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AssertionStatus {
        if self.is_unset() {
            return AssertionStatus::Skipped("no expiration threshold configured".to_string());
        }
        let Some(end) = end else {
            return AssertionStatus::Errored("expiration date is unknown".to_string());
        };

        if let Some(start) = start {
            if now < start {
                return AssertionStatus::Failed(format!("not valid before {}", start.to_rfc3339()));
            }
        }
        if now >= end {
            return AssertionStatus::Failed(format!("expired on {}", end.to_rfc3339()));
        }

        if let Some(days) = self.days {
            let deadline = end - TimeDelta::days(i64::from(days));
            if now >= deadline {
                return AssertionStatus::Failed(format!(
                    "expires on {}, within the {days} day threshold",
                    end.to_rfc3339()
                ));
            }
        }

        if let Some(percent) = self.percent {
            let Some(start) = start else {
                return AssertionStatus::Errored(
                    "relative threshold needs a start date and none is known".to_string(),
                );
            };
            let Some(deadline) = relative_deadline(start, end, percent) else {
                return AssertionStatus::Errored(format!(
                    "period from {} to {} is not usable for a relative threshold",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                ));
            };
            if now >= deadline {
                return AssertionStatus::Failed(format!(
                    "expires on {}, within the {percent}% threshold (from {})",
                    end.to_rfc3339(),
                    deadline.to_rfc3339()
                ));
            }
        }

        AssertionStatus::Passed
    }
}

/// `end - (end - start) * percent / 100`, or `None` for an inverted period.
pub(crate) fn relative_deadline(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    percent: u32,
) -> Option<DateTime<Utc>> {
    let total = (end - start).num_milliseconds();
    if total < 0 {
        return None;
    }
    let window = total.checked_mul(i64::from(percent))? / 100;
    end.checked_sub_signed(TimeDelta::milliseconds(window))
}

//! Error handling and run statistics.
//!
//! This module provides:
//! - The error taxonomy (configuration, fetch, parse, whois)
//! - Per-check error wrapping and categorization
//! - Infrastructure error statistics shared across check tasks
//!
//! Configuration errors abort the run. Every other error is scoped to the
//! check that raised it and shows up in the report as an errored assertion.

mod stats;
mod types;

use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    CheckError, ConfigurationError, ErrorType, FetchError, InitializationError, ParseError,
    WhoisError,
};

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
///
/// The strategy is unbounded; callers cap it with `.take(retries)`.
pub fn get_retry_strategy() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
}

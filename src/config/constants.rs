//! Configuration constants.
//!
//! Timeouts, limits and retry parameters used throughout the application.

use std::time::Duration;

/// Default number of checks evaluated concurrently
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

// Network operation timeouts
/// Default TCP connect / TLS handshake timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
/// Per-check processing timeout.
/// Covers fetch retries, validation and whois lookups with their retries.
pub const CHECK_PROCESSING_TIMEOUT: Duration = Duration::from_secs(60);

/// Port used when a site URL has none
pub const DEFAULT_HTTPS_PORT: u16 = 443;

// Whois
/// Whois protocol port
pub const WHOIS_PORT: u16 = 43;
/// Registry bootstrap server; its `refer:` line names the TLD's registry
pub const WHOIS_BOOTSTRAP_SERVER: &str = "whois.iana.org";
/// Whois connect/read timeout in seconds
pub const WHOIS_TIMEOUT_SECS: u64 = 10;
/// Maximum whois response size in bytes (1MB)
pub const WHOIS_MAX_RESPONSE_SIZE: usize = 1024 * 1024;
/// Maximum number of referrals followed after the bootstrap server
pub const WHOIS_MAX_REFERRAL_DEPTH: u8 = 3;

// Retry strategy
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
/// Retries after the initial whois attempt (3 attempts total)
pub const WHOIS_RETRY_ATTEMPTS: usize = 2;

// Threshold ranges accepted in the check document
/// Largest accepted absolute threshold, in days
pub const MAX_THRESHOLD_DAYS: u32 = 365;
/// Largest accepted relative threshold, in percent
pub const MAX_THRESHOLD_PERCENT: u32 = 100;

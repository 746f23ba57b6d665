//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, retry parameters)
//! - CLI option types and parsing
//! - The YAML check document
//! - Platform default CA bundle resolution

mod checks;
mod constants;
mod platform;
mod types;

// Re-export all constants
pub use checks::{load_checks, parse_checks, CertificateCheckSpec, CheckDocument, DomainCheckSpec};
pub use constants::*;
pub use platform::{ca_bundle_candidates, resolve_ca_bundle};
pub use types::{ChainTime, Config, LogFormat, LogLevel, OutputFormat};

//! tls_watch library: certificate and domain registration checks
//!
//! This library fetches the TLS certificates that sites present, parses and
//! validates them, looks up domain registrations over whois, and evaluates
//! operator-defined expectations (expiry thresholds, issuer, hostnames,
//! registrar, name servers) into a per-check report.
//!
//! Retrieval and validation are separate phases: the handshake accepts any
//! certificate so that expired, self-signed or mismatched certificates can be
//! inspected, and chain trust is evaluated afterwards against a trust store.
//!
//! # Example
//!
//! ```no_run
//! use tls_watch::{run_with_config, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     config_file: std::path::PathBuf::from("checks.yaml"),
//!     bundled_roots: true,
//!     ..Default::default()
//! };
//!
//! let report = run_with_config(&config).await?;
//! println!(
//!     "{} checks: {} passed, {} failed",
//!     report.summary.total, report.summary.passed, report.summary.failed
//! );
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

pub mod cache;
pub mod certificate;
pub mod checks;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod output;
pub mod run;
pub mod tls;
pub mod validation;
pub mod whois;

// Re-export public API
pub use config::Config;
pub use run::{run_checks, run_with_config, CheckContext, RunOptions, RunReport, RunSummary};

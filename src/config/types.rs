//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and run configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY};
use crate::validation::ValidationTime;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, one block per check
    Human,
    /// A single JSON document
    Json,
}

/// Point in time used for chain validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChainTime {
    /// Validate at the current time clamped into the leaf's validity window
    LeafValidity,
    /// Validate at the current time; an expired leaf makes the chain invalid
    Current,
}

impl From<ChainTime> for ValidationTime {
    fn from(t: ChainTime) -> Self {
        match t {
            ChainTime::LeafValidity => ValidationTime::WithinLeafValidity,
            ChainTime::Current => ValidationTime::Current,
        }
    }
}

/// Run configuration.
///
/// Parsed from the command line by the binary, or constructed directly by
/// library users.
///
/// # Examples
///
/// ```no_run
/// use tls_watch::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     config_file: PathBuf::from("checks.yaml"),
///     max_concurrency: 4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tls_watch",
    version,
    about = "Checks TLS certificates and domain registrations against expectations"
)]
pub struct Config {
    /// YAML document listing certificate and domain checks
    pub config_file: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// PEM bundle of trusted roots (defaults to the platform's system bundle)
    #[arg(long)]
    pub ca_bundle: Option<PathBuf>,

    /// Trust the Mozilla roots compiled into the binary instead of a bundle file
    #[arg(long, conflicts_with = "ca_bundle")]
    pub bundled_roots: bool,

    /// Point in time used for chain validation
    #[arg(long, value_enum, default_value_t = ChainTime::LeafValidity)]
    pub chain_time: ChainTime,

    /// TCP connect and TLS handshake timeout in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Maximum number of checks evaluated concurrently
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Extra attempts for certificate fetches that fail with a transient error
    #[arg(long, default_value_t = 0)]
    pub fetch_retries: usize,

    /// Fetch the certificate once per check instead of once per host
    #[arg(long)]
    pub no_cache: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Disable colors in the human report
    #[arg(long)]
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("checks.yaml"),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            ca_bundle: None,
            bundled_roots: false,
            chain_time: ChainTime::LeafValidity,
            timeout_seconds: DEFAULT_FETCH_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fetch_retries: 0,
            no_cache: false,
            format: OutputFormat::Human,
            no_color: false,
        }
    }
}

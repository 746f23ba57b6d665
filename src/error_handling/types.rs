//! Error type definitions.
//!
//! This module defines the error taxonomy used throughout the application:
//! configuration errors abort the run, everything else is scoped to one check.

use std::path::PathBuf;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Errors that abort the run before any check executes.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// The check document could not be read from disk.
    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        /// Path of the config file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The check document is not valid YAML or does not match the schema.
    #[error("Malformed config: {0}")]
    MalformedConfig(#[from] serde_yaml::Error),

    /// A field value is outside its allowed range or otherwise invalid.
    #[error("Invalid value for {field} in {check}: {reason}")]
    InvalidValue {
        /// Check identifier (site or domain)
        check: String,
        /// Offending field name
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },

    /// No CA bundle path was configured and the platform has no default.
    #[error("No default CA bundle location for this platform; pass --ca-bundle")]
    NoDefaultCaBundle,

    /// The CA bundle could not be opened.
    #[error("Failed to open CA bundle {path}: {source}")]
    CaBundleUnreadable {
        /// Path of the bundle
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The CA bundle was readable but contained no usable root certificate.
    #[error("CA bundle {path} contains no usable certificates")]
    CaBundleEmpty {
        /// Path of the bundle
        path: PathBuf,
    },
}

/// Errors raised while retrieving a certificate from a host.
///
/// Each of these is fatal for the check that triggered it and nothing else.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The hostname cannot be used as a TLS server name.
    #[error("Invalid server name {host}: {reason}")]
    InvalidServerName {
        /// Hostname as configured
        host: String,
        /// Reason reported by rustls
        reason: String,
    },

    /// Name resolution failed or returned no addresses.
    #[error("DNS resolution failed for {host}: {reason}")]
    Dns {
        /// Hostname being resolved
        host: String,
        /// Resolver message
        reason: String,
    },

    /// TCP connection refused or otherwise failed.
    #[error("Failed to connect to {host}:{port}: {reason}")]
    Connect {
        /// Hostname
        host: String,
        /// Port
        port: u16,
        /// Socket error message
        reason: String,
    },

    /// A network phase did not complete within the configured timeout.
    #[error("{phase} timeout for {host}:{port} ({seconds}s)")]
    Timeout {
        /// Phase that timed out
        phase: &'static str,
        /// Hostname
        host: String,
        /// Port
        port: u16,
        /// Timeout that elapsed, in seconds
        seconds: u64,
    },

    /// The TLS handshake itself failed (protocol mismatch, alert, reset).
    #[error("TLS handshake failed for {host}:{port}: {reason}")]
    Handshake {
        /// Hostname
        host: String,
        /// Port
        port: u16,
        /// rustls error message
        reason: String,
    },

    /// The handshake completed but the peer sent no certificate.
    #[error("{host}:{port} presented no certificate")]
    NoCertificate {
        /// Hostname
        host: String,
        /// Port
        port: u16,
    },
}

impl FetchError {
    /// Returns true for failures that might succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Dns { .. } | FetchError::Connect { .. } | FetchError::Timeout { .. }
        )
    }
}

/// Errors raised while turning fetched data into a `ParsedCertificate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The bytes are not a DER-encoded X.509 certificate.
    #[error("Malformed certificate: {0}")]
    MalformedCertificate(String),

    /// A timestamp in a peer dictionary could not be parsed.
    #[error("Invalid certificate timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// Errors raised by the whois collaborator.
#[derive(Error, Debug, Clone)]
pub enum WhoisError {
    /// The domain is not something we can query.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// No registry server could be found for the domain's TLD.
    #[error("No whois server found for {0}")]
    NoServer(String),

    /// Connection, read or write failure.
    #[error("Whois query to {server} failed: {reason}")]
    Query {
        /// Server queried
        server: String,
        /// Failure description
        reason: String,
    },

    /// The server did not answer within the configured timeout.
    #[error("Whois query to {server} timed out")]
    Timeout {
        /// Server queried
        server: String,
    },
}

impl WhoisError {
    /// Returns true for failures that might succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, WhoisError::Query { .. } | WhoisError::Timeout { .. })
    }
}

/// Errors that prevent a single check from being evaluated.
#[derive(Error, Debug, Clone)]
pub enum CheckError {
    /// Certificate retrieval failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Certificate parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Whois lookup failed.
    #[error(transparent)]
    Whois(#[from] WhoisError),

    /// The whole check exceeded the per-check processing timeout.
    #[error("Check timed out after {0}s")]
    Timeout(u64),
}

impl CheckError {
    /// Returns the category of this error for reporting.
    pub fn kind(&self) -> ErrorType {
        match self {
            CheckError::Fetch(FetchError::Timeout { .. }) | CheckError::Timeout(_) => {
                ErrorType::Timeout
            }
            CheckError::Fetch(FetchError::Dns { .. }) => ErrorType::DnsLookup,
            CheckError::Fetch(FetchError::Handshake { .. }) => ErrorType::TlsHandshake,
            CheckError::Fetch(_) => ErrorType::Connection,
            CheckError::Parse(_) => ErrorType::CertificateParse,
            CheckError::Whois(_) => ErrorType::WhoisLookup,
        }
    }
}

/// Categories of infrastructure errors, used in run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// TCP connect failure or invalid server name
    Connection,
    /// Name resolution failure
    DnsLookup,
    /// TLS handshake failure
    TlsHandshake,
    /// Fetch or check timeout
    Timeout,
    /// Certificate could not be parsed
    CertificateParse,
    /// Whois lookup failure
    WhoisLookup,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Returns a human-readable string representation of the error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Connection => "Connection error",
            ErrorType::DnsLookup => "DNS lookup error",
            ErrorType::TlsHandshake => "TLS handshake error",
            ErrorType::Timeout => "Timeout",
            ErrorType::CertificateParse => "Certificate parse error",
            ErrorType::WhoisLookup => "Whois lookup error",
        }
    }
}

//! WHOIS domain registration lookups.
//!
//! Domain checks only need a registration's dates, registrar and name
//! servers. `WhoisLookup` is the seam the check runner depends on;
//! `WhoisClient` is the port-43 implementation, which starts at the IANA
//! bootstrap server and follows referrals to the registry and registrar.

mod client;
mod parse;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error_handling::WhoisError;

pub use client::WhoisClient;
pub use parse::parse_whois_response;

/// Registration data extracted from a WHOIS response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WhoisRecord {
    /// Domain queried (normalized)
    pub domain: String,
    /// Server whose response the record was parsed from
    pub whois_server: String,
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Lower-cased, without trailing dots, in response order
    pub name_servers: Vec<String>,
}

/// Looks up the registration record of a domain.
pub trait WhoisLookup: Send + Sync {
    fn lookup(&self, domain: &str) -> impl Future<Output = Result<WhoisRecord, WhoisError>> + Send;
}

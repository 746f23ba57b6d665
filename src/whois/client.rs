//! Port-43 WHOIS client.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_retry::RetryIf;

use super::{parse_whois_response, WhoisLookup, WhoisRecord};
use crate::certificate::to_ascii_hostname;
use crate::config::{
    WHOIS_BOOTSTRAP_SERVER, WHOIS_MAX_REFERRAL_DEPTH, WHOIS_MAX_RESPONSE_SIZE, WHOIS_PORT,
    WHOIS_RETRY_ATTEMPTS, WHOIS_TIMEOUT_SECS,
};
use crate::error_handling::{get_retry_strategy, WhoisError};

/// Lines that name the next server to ask, most specific first.
const REFERRAL_PATTERN: &str =
    r"(?im)^[ \t]*(?:refer|registrar whois server|whois server|referralserver)[ \t]*:[ \t]*(?:r?whois://)?([A-Za-z0-9.\-]+)";

/// Compiles a pattern that is a compile-time constant; failure is a programming error.
fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!("Failed to compile regex pattern '{pattern}' in {context}: {e}. This is a programming error.")
    })
}

static REFERRAL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(REFERRAL_PATTERN, "REFERRAL_RE"));

/// WHOIS client with referral following and retries.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    bootstrap_server: String,
    port: u16,
    timeout: Duration,
    retries: usize,
    max_referral_depth: u8,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self {
            bootstrap_server: WHOIS_BOOTSTRAP_SERVER.to_string(),
            port: WHOIS_PORT,
            timeout: Duration::from_secs(WHOIS_TIMEOUT_SECS),
            retries: WHOIS_RETRY_ATTEMPTS,
            max_referral_depth: WHOIS_MAX_REFERRAL_DEPTH,
        }
    }

    /// Replaces the first server queried and the port used for every query.
    pub fn with_bootstrap(mut self, server: impl Into<String>, port: u16) -> Self {
        self.bootstrap_server = server.into();
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Queries one server, retrying transient failures.
    async fn query_with_retry(&self, server: &str, query: &str) -> Result<String, WhoisError> {
        RetryIf::start(
            get_retry_strategy().take(self.retries),
            || self.query_server(server, query),
            |e: &WhoisError| {
                let retry = e.is_transient();
                if retry {
                    debug!("Retrying whois query to {server}: {e}");
                }
                retry
            },
        )
        .await
    }

    async fn query_server(&self, server: &str, query: &str) -> Result<String, WhoisError> {
        let query_error = |reason: String| WhoisError::Query {
            server: server.to_string(),
            reason,
        };
        let timed_out = || WhoisError::Timeout {
            server: server.to_string(),
        };

        let mut stream = timeout(self.timeout, TcpStream::connect((server, self.port)))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| query_error(format!("connect failed: {e}")))?;

        timeout(self.timeout, stream.write_all(format!("{query}\r\n").as_bytes()))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| query_error(format!("write failed: {e}")))?;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    response.extend_from_slice(&buf[..n]);
                    if response.len() > WHOIS_MAX_RESPONSE_SIZE {
                        return Err(query_error("response too large".to_string()));
                    }
                }
                Ok(Err(e)) => return Err(query_error(format!("read failed: {e}"))),
                // Some servers never close the connection; keep what arrived.
                Err(_) if !response.is_empty() => break,
                Err(_) => return Err(timed_out()),
            }
        }

        Ok(decode_response(response))
    }
}

impl WhoisLookup for WhoisClient {
    /// Looks up `domain`, following referrals from the bootstrap server.
    ///
    /// The bootstrap response must refer to a registry; a registry response
    /// may refer further to a registrar. When a later referral fails, the
    /// last successful non-bootstrap response is used instead.
    async fn lookup(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let domain = normalize_domain(domain)?;
        let mut server = self.bootstrap_server.clone();
        let mut visited = HashSet::new();
        let mut best: Option<(String, String)> = None;

        for depth in 0..=self.max_referral_depth {
            visited.insert(server.to_ascii_lowercase());
            debug!("Querying whois server {server} for {domain} (depth {depth})");

            let raw = match self.query_with_retry(&server, &domain).await {
                Ok(raw) => raw,
                Err(e) if best.is_some() => {
                    warn!("Whois referral to {server} failed, using previous response: {e}");
                    break;
                }
                Err(e) => return Err(e),
            };

            let referral = extract_referral(&raw);
            if depth > 0 {
                best = Some((server.clone(), raw));
            }

            match referral {
                Some(next) if visited.contains(&next) => {
                    debug!("Ignoring circular whois referral to {next}");
                    break;
                }
                Some(next) if depth == self.max_referral_depth => {
                    warn!("Whois referral depth exceeded at {server}; not following {next}");
                    break;
                }
                Some(next) => server = next,
                None if depth == 0 => {
                    return Err(WhoisError::NoServer(domain.clone()));
                }
                None => break,
            }
        }

        let (server, raw) = best.ok_or_else(|| WhoisError::NoServer(domain.clone()))?;
        info!("Whois record for {domain} from {server}");
        Ok(parse_whois_response(&domain, &server, &raw))
    }
}

fn normalize_domain(domain: &str) -> Result<String, WhoisError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.parse::<IpAddr>().is_ok() || !trimmed.contains('.') {
        return Err(WhoisError::InvalidDomain(domain.to_string()));
    }
    to_ascii_hostname(trimmed).ok_or_else(|| WhoisError::InvalidDomain(domain.to_string()))
}

/// Decodes a response as UTF-8, falling back to Latin-1.
fn decode_response(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Returns the next server named by a response, lower-cased.
fn extract_referral(response: &str) -> Option<String> {
    REFERRAL_RE
        .captures_iter(response)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_ascii_lowercase())
        .find(|server| server.contains('.'))
}

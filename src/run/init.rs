//! Run resource initialization.
//!
//! Builds the trust store, chain validator and TLS fetcher from the run
//! configuration. Anything that fails here is a configuration error and
//! aborts the run before any check executes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use rustls::crypto::CryptoProvider;

use crate::config::{resolve_ca_bundle, Config, CHECK_PROCESSING_TIMEOUT};
use crate::tls::{RetryingFetcher, TlsFetcher};
use crate::validation::{ChainValidator, TrustStore};

/// Limits applied to every check of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of checks in flight
    pub max_concurrency: usize,
    /// TCP connect and TLS handshake timeout, per phase
    pub fetch_timeout: Duration,
    /// Budget for one whole check, retries included
    pub check_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            fetch_timeout: Duration::from_secs(config.timeout_seconds),
            check_timeout: CHECK_PROCESSING_TIMEOUT,
        }
    }
}

/// Loads the trust store selected by the configuration.
pub fn init_trust_store(config: &Config) -> Result<TrustStore> {
    let store = if config.bundled_roots {
        TrustStore::bundled()
    } else {
        let path = resolve_ca_bundle(config.ca_bundle.as_deref())
            .context("Failed to locate a CA bundle")?;
        TrustStore::from_pem_file(&path).context("Failed to load trust store")?
    };
    info!("Trust store: {} root(s) from {}", store.len(), store.source());
    Ok(store)
}

/// Builds the chain validator for the configured validation time.
pub fn init_validator(config: &Config, provider: Arc<CryptoProvider>) -> Result<ChainValidator> {
    let store = init_trust_store(config)?;
    Ok(ChainValidator::new(store, provider, config.chain_time.into()))
}

/// Builds the TLS fetcher, wrapped for the configured number of retries.
pub fn init_fetcher(config: &Config, provider: Arc<CryptoProvider>) -> Result<RetryingFetcher<TlsFetcher>> {
    let fetcher = TlsFetcher::new(provider).context("Failed to build TLS client configuration")?;
    Ok(RetryingFetcher::new(fetcher, config.fetch_retries))
}

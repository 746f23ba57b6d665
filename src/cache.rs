//! Per-run certificate fetch cache.
//!
//! Checks that share a host reuse one fetch. The first caller for a
//! `(hostname, port)` pair performs the handshake; concurrent callers for the
//! same pair wait on it and receive the same result, including failures.
//! Nothing is persisted past the run.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::{Mutex, OnceCell};

use crate::error_handling::FetchError;
use crate::tls::{CertificateFetcher, Endpoint, FetchedCertificate};

type FetchSlot = Arc<OnceCell<Result<FetchedCertificate, FetchError>>>;

/// Wraps a fetcher so each host and port is fetched at most once.
pub struct CachingFetcher<F> {
    inner: F,
    entries: Mutex<HashMap<(String, u16), FetchSlot>>,
}

impl<F> CachingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct endpoints requested so far.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: CertificateFetcher> CertificateFetcher for CachingFetcher<F> {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<FetchedCertificate, FetchError> {
        let key = (endpoint.hostname.to_ascii_lowercase(), endpoint.port);
        let slot = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key).or_default())
        };

        if slot.initialized() {
            debug!("Reusing cached certificate for {endpoint}");
        }
        slot.get_or_init(|| self.inner.fetch(endpoint)).await.clone()
    }
}

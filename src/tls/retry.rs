//! Retry wrapper for certificate fetches.

use log::debug;
use tokio_retry::RetryIf;

use super::{CertificateFetcher, Endpoint, FetchedCertificate};
use crate::error_handling::{get_retry_strategy, FetchError};

/// Retries transient fetch failures with exponential backoff.
///
/// Only DNS, connect and timeout failures are retried; a failed handshake or
/// a missing certificate is returned on the first attempt.
pub struct RetryingFetcher<F> {
    inner: F,
    retries: usize,
}

impl<F> RetryingFetcher<F> {
    /// Wraps `inner`, allowing up to `retries` extra attempts.
    pub fn new(inner: F, retries: usize) -> Self {
        Self { inner, retries }
    }
}

impl<F: CertificateFetcher> CertificateFetcher for RetryingFetcher<F> {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<FetchedCertificate, FetchError> {
        if self.retries == 0 {
            return self.inner.fetch(endpoint).await;
        }

        RetryIf::start(
            get_retry_strategy().take(self.retries),
            || self.inner.fetch(endpoint),
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    debug!("Retrying fetch for {endpoint}: {e}");
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FlakyFetcher {
        calls: AtomicUsize,
        error: FetchError,
    }

    impl CertificateFetcher for FlakyFetcher {
        async fn fetch(&self, _endpoint: &Endpoint) -> Result<FetchedCertificate, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn flaky(error: FetchError) -> FlakyFetcher {
        FlakyFetcher {
            calls: AtomicUsize::new(0),
            error,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let fetcher = RetryingFetcher::new(
            flaky(FetchError::Connect {
                host: "example.com".into(),
                port: 443,
                reason: "refused".into(),
            }),
            2,
        );
        let result = fetcher.fetch(&Endpoint::new("example.com", 443)).await;
        assert!(result.is_err());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let fetcher = RetryingFetcher::new(
            flaky(FetchError::Handshake {
                host: "example.com".into(),
                port: 443,
                reason: "alert".into(),
            }),
            2,
        );
        let result = fetcher.fetch(&Endpoint::new("example.com", 443)).await;
        assert!(matches!(result, Err(FetchError::Handshake { .. })));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_calls_once() {
        let fetcher = RetryingFetcher::new(
            flaky(FetchError::Dns {
                host: "nope.invalid".into(),
                reason: "NXDOMAIN".into(),
            }),
            0,
        );
        let _ = fetcher.fetch(&Endpoint::new("nope.invalid", 443)).await;
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }
}

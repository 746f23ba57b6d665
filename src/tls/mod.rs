//! TLS certificate retrieval.
//!
//! This module connects to TLS endpoints and returns the certificate chain the
//! peer presents, without judging it:
//! - Hostname resolution and TCP connect with a timeout
//! - TLS 1.2/1.3 handshake with SNI, chain verification disabled
//! - Leaf plus full presented chain, in the peer's order
//!
//! Trust is decided later by `crate::validation`, so an expired or
//! self-signed certificate is still returned here instead of aborting the
//! connection. Uses `tokio-rustls` for async TLS connections.

mod endpoint;
mod retry;
mod verifier;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::ClientConfig;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::certificate::to_ascii_hostname;
use crate::error_handling::FetchError;

pub use endpoint::Endpoint;
pub use retry::RetryingFetcher;

use verifier::AcceptAnyServerCert;

/// How long to wait for the peer to acknowledge close_notify.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Certificates presented by a peer during one handshake.
///
/// The chain is kept exactly as presented: leaf first, then whatever
/// intermediates (and possibly the root) the server chose to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCertificate {
    chain: Vec<CertificateDer<'static>>,
}

impl FetchedCertificate {
    /// Wraps a presented chain. Returns `None` when the chain is empty.
    pub fn from_chain(chain: Vec<CertificateDer<'static>>) -> Option<Self> {
        if chain.is_empty() {
            None
        } else {
            Some(Self { chain })
        }
    }

    /// The end-entity certificate.
    pub fn leaf(&self) -> &CertificateDer<'static> {
        &self.chain[0]
    }

    /// The full presented chain, leaf first.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    /// Everything the peer sent after the leaf.
    pub fn intermediates(&self) -> &[CertificateDer<'static>] {
        &self.chain[1..]
    }
}

/// Retrieves the certificate chain served at an endpoint.
pub trait CertificateFetcher: Send + Sync {
    /// Connects to `endpoint` and returns what the peer presented.
    fn fetch(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<FetchedCertificate, FetchError>> + Send;
}

/// Fetches certificates over real TLS connections.
#[derive(Clone)]
pub struct TlsFetcher {
    config: Arc<ClientConfig>,
}

impl TlsFetcher {
    /// Builds a fetcher that offers every protocol version the provider
    /// supports and accepts any certificate chain.
    pub fn new(provider: Arc<CryptoProvider>) -> Result<Self, rustls::Error> {
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_protocol_versions(rustls::ALL_VERSIONS)?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
        })
    }
}

impl CertificateFetcher for TlsFetcher {
    /// Retrieves the certificate chain for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The hostname is not a valid server name
    /// - Name resolution fails or times out
    /// - TCP connection fails or times out
    /// - The TLS handshake fails or times out
    /// - The peer presents no certificate
    ///
    /// The socket and TLS session are dropped on every path out of this
    /// function; a close_notify is attempted after a successful handshake.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<FetchedCertificate, FetchError> {
        let port = endpoint.port;
        let host =
            to_ascii_hostname(&endpoint.hostname).unwrap_or_else(|| endpoint.hostname.clone());
        let seconds = endpoint.timeout.as_secs();

        let server_name =
            ServerName::try_from(host.clone()).map_err(|e| FetchError::InvalidServerName {
                host: host.clone(),
                reason: e.to_string(),
            })?;

        debug!("Resolving {host}:{port}");
        // Collected here so nothing borrowed from `host` outlives this statement.
        let resolved: Result<std::io::Result<Vec<SocketAddr>>, _> =
            tokio::time::timeout(endpoint.timeout, tokio::net::lookup_host((host.as_str(), port)))
                .await
                .map(|lookup| lookup.map(|addrs| addrs.collect()));
        let addrs = match resolved {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => {
                return Err(FetchError::Dns {
                    host,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    phase: "DNS lookup",
                    host,
                    port,
                    seconds,
                })
            }
        };
        if addrs.is_empty() {
            return Err(FetchError::Dns {
                host,
                reason: "no addresses returned".to_string(),
            });
        }

        debug!("Connecting to {host}:{port}");
        let sock = match tokio::time::timeout(endpoint.timeout, connect_any(&addrs)).await {
            Ok(Ok(sock)) => sock,
            Ok(Err(e)) => {
                warn!("Failed to connect to {host}:{port} - {e}");
                return Err(FetchError::Connect {
                    host,
                    port,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!("TCP connection timeout for {host}:{port}");
                return Err(FetchError::Timeout {
                    phase: "TCP connect",
                    host,
                    port,
                    seconds,
                });
            }
        };

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let mut tls_stream =
            match tokio::time::timeout(endpoint.timeout, connector.connect(server_name, sock)).await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!("TLS handshake failed for {host}:{port}: {e}");
                    return Err(FetchError::Handshake {
                        host,
                        port,
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!("TLS handshake timeout for {host}:{port}");
                    return Err(FetchError::Timeout {
                        phase: "TLS handshake",
                        host,
                        port,
                        seconds,
                    });
                }
            };

        let (_, connection) = tls_stream.get_ref();
        debug!(
            "Negotiated {:?} / {:?} with {host}:{port}",
            connection.protocol_version(),
            connection.negotiated_cipher_suite().map(|cs| cs.suite())
        );
        let chain = connection
            .peer_certificates()
            .map(<[CertificateDer<'static>]>::to_vec)
            .unwrap_or_default();

        if let Err(e) = tokio::time::timeout(SHUTDOWN_GRACE, tls_stream.shutdown()).await {
            debug!("close_notify to {host}:{port} not acknowledged: {e}");
        }

        let fetched =
            FetchedCertificate::from_chain(chain).ok_or_else(|| FetchError::NoCertificate {
                host: host.clone(),
                port,
            })?;
        info!(
            "Fetched {} certificate(s) from {host}:{port}",
            fetched.chain().len()
        );
        Ok(fetched)
    }
}

/// Connects to the first address that accepts.
async fn connect_any(addrs: &[SocketAddr]) -> std::io::Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(sock) => return Ok(sock),
            Err(e) => {
                debug!("Connect to {addr} failed: {e}");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses to connect to")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }

    #[test]
    fn test_fetched_certificate_requires_leaf() {
        assert!(FetchedCertificate::from_chain(Vec::new()).is_none());

        let leaf = CertificateDer::from(vec![1u8, 2, 3]);
        let intermediate = CertificateDer::from(vec![4u8, 5, 6]);
        let fetched =
            FetchedCertificate::from_chain(vec![leaf.clone(), intermediate.clone()]).unwrap();
        assert_eq!(fetched.leaf(), &leaf);
        assert_eq!(fetched.chain().len(), 2);
        assert_eq!(fetched.intermediates(), &[intermediate]);
    }

    #[test]
    fn test_tls_fetcher_builds() {
        assert!(TlsFetcher::new(provider()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = TlsFetcher::new(provider()).unwrap();
        let endpoint = Endpoint::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
        let err = fetcher.fetch(&endpoint).await.unwrap_err();
        assert!(
            matches!(err, FetchError::Connect { .. }),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_unresolvable_host() {
        let fetcher = TlsFetcher::new(provider()).unwrap();
        let endpoint =
            Endpoint::new("tls-watch.invalid", 443).with_timeout(Duration::from_secs(2));
        let err = fetcher.fetch(&endpoint).await.unwrap_err();
        match err {
            FetchError::Dns { host, .. } | FetchError::Timeout { host, .. } => {
                assert_eq!(host, "tls-watch.invalid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_handshake_failure_on_plaintext_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let _ = sock.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
            }
        });

        let fetcher = TlsFetcher::new(provider()).unwrap();
        let endpoint = Endpoint::new("localhost", port).with_timeout(Duration::from_secs(2));
        let err = fetcher.fetch(&endpoint).await.unwrap_err();
        assert!(
            matches!(
                err,
                FetchError::Handshake { .. } | FetchError::Connect { .. }
            ),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_fetch_handshake_timeout() {
        // Accepts the connection but never speaks TLS.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((sock, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(sock);
            }
        });

        let fetcher = TlsFetcher::new(provider()).unwrap();
        let endpoint = Endpoint::new("127.0.0.1", port).with_timeout(Duration::from_millis(300));
        let err = fetcher.fetch(&endpoint).await.unwrap_err();
        assert!(
            matches!(
                err,
                FetchError::Timeout {
                    phase: "TLS handshake",
                    ..
                }
            ),
            "unexpected error: {err:?}"
        );
    }
}

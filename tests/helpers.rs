// Shared test helpers: certificate minting and local TLS servers.
//
// Certificates are minted with rcgen; servers are tokio-rustls acceptors on
// 127.0.0.1 with an ephemeral port, reachable as `localhost`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A minted certificate and its key.
#[allow(dead_code)] // Not every test file uses every field
pub struct Minted {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

#[allow(dead_code)]
impl Minted {
    pub fn der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    pub fn private_key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key.serialize_der()))
    }
}

/// A self-signed CA with the given organization name.
#[allow(dead_code)]
pub fn mint_ca(organization: &str) -> Minted {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::OrganizationName, organization);
    params
        .distinguished_name
        .push(DnType::CommonName, format!("{organization} Root"));
    let cert = params.self_signed(&key).unwrap();
    Minted { cert, key }
}

fn leaf_params(names: &[&str], validity: ((i32, u8, u8), (i32, u8, u8))) -> CertificateParams {
    let mut params =
        CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>()).unwrap();
    let ((fy, fm, fd), (ty, tm, td)) = validity;
    params.not_before = rcgen::date_time_ymd(fy, fm, fd);
    params.not_after = rcgen::date_time_ymd(ty, tm, td);
    params
        .distinguished_name
        .push(DnType::CommonName, names.first().copied().unwrap_or("leaf"));
    params
}

/// A leaf for `names`, issued by `issuer`.
#[allow(dead_code)]
pub fn mint_leaf(issuer: &Minted, names: &[&str], validity: ((i32, u8, u8), (i32, u8, u8))) -> Minted {
    let key = KeyPair::generate().unwrap();
    let cert = leaf_params(names, validity)
        .signed_by(&key, &issuer.cert, &issuer.key)
        .unwrap();
    Minted { cert, key }
}

/// A self-signed leaf for `names`.
#[allow(dead_code)]
pub fn mint_self_signed(names: &[&str], validity: ((i32, u8, u8), (i32, u8, u8))) -> Minted {
    let key = KeyPair::generate().unwrap();
    let cert = leaf_params(names, validity).self_signed(&key).unwrap();
    Minted { cert, key }
}

/// A running TLS server.
#[allow(dead_code)]
pub struct TlsServer {
    pub port: u16,
    accepted: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl TlsServer {
    /// Number of TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn site(&self) -> String {
        format!("https://localhost:{}/", self.port)
    }
}

/// Serves `chain` (leaf first) with `key` until the test runtime shuts down.
#[allow(dead_code)]
pub async fn spawn_tls_server(chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> TlsServer {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        loop {
            let Ok((sock, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(sock).await {
                    // Hold the session open until the client closes it.
                    let mut buf = [0u8; 64];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    TlsServer { port, accepted }
}

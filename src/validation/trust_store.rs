//! Trust anchors for chain validation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;

use crate::error_handling::ConfigurationError;

/// A set of trusted root certificates.
#[derive(Debug, Clone)]
pub struct TrustStore {
    roots: Arc<RootCertStore>,
    source: String,
}

impl TrustStore {
    /// Loads every certificate from a PEM bundle.
    ///
    /// PEM sections that are not certificates are skipped; certificates that
    /// rustls cannot use as anchors are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the file cannot be opened or yields no
    /// usable root certificate.
    pub fn from_pem_file(path: &Path) -> Result<Self, ConfigurationError> {
        let file = File::open(path).map_err(|source| ConfigurationError::CaBundleUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut certs = Vec::new();
        for item in rustls_pemfile::certs(&mut reader) {
            match item {
                Ok(cert) => certs.push(cert),
                Err(e) => warn!("Skipping unreadable PEM entry in {}: {e}", path.display()),
            }
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(certs);
        if ignored > 0 {
            warn!(
                "Ignored {ignored} unusable certificate(s) in {}",
                path.display()
            );
        }
        if added == 0 {
            return Err(ConfigurationError::CaBundleEmpty {
                path: path.to_path_buf(),
            });
        }
        info!("Loaded {added} trusted root(s) from {}", path.display());

        Ok(Self {
            roots: Arc::new(roots),
            source: path.display().to_string(),
        })
    }

    /// The Mozilla root program, compiled into the binary.
    pub fn bundled() -> Self {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self {
            roots: Arc::new(roots),
            source: "bundled Mozilla roots".to_string(),
        }
    }

    /// Builds a store from already-decoded certificates.
    pub fn from_certificates(certs: impl IntoIterator<Item = CertificateDer<'static>>) -> Self {
        let mut roots = RootCertStore::empty();
        roots.add_parsable_certificates(certs);
        Self {
            roots: Arc::new(roots),
            source: "in-memory roots".to_string(),
        }
    }

    pub fn roots(&self) -> &RootCertStore {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Where the anchors came from, for log messages.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};

    use super::*;

    fn ca_pem() -> String {
        let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().pem()
    }

    #[test]
    fn test_from_pem_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", ca_pem()).unwrap();
        writeln!(file, "{}", ca_pem()).unwrap();

        let store = TrustStore::from_pem_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_missing_bundle_is_configuration_error() {
        let err = TrustStore::from_pem_file(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, ConfigurationError::CaBundleUnreadable { .. }));
    }

    #[test]
    fn test_empty_bundle_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "no certificates here").unwrap();

        let err = TrustStore::from_pem_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigurationError::CaBundleEmpty { .. }));
    }

    #[test]
    fn test_bundled_roots_not_empty() {
        let store = TrustStore::bundled();
        assert!(store.len() > 100);
    }
}

//! Process-wide initialization.
//!
//! This module provides:
//! - Logger setup (plain or JSON lines on stderr)
//! - The `rustls` crypto provider shared by the fetcher and the validator
//!
//! Both are meant to be called once, early, by the binary.

mod logger;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};

// Re-export public API
pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Installs the `ring` provider as the process default. This must be called
/// before any TLS connection is established.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}

/// Returns the process default crypto provider, or a fresh `ring` provider
/// when none has been installed (library use, tests).
pub fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(default_provider()))
}

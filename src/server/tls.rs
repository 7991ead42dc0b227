//! TLS listener support.
//!
//! Loads the PEM certificate chain and private key into a rustls server
//! configuration advertising `h2` ahead of `http/1.1` over ALPN, so browsers
//! negotiate HTTP/2 and with it server push.

use pushcast_common::{Error, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// ALPN protocol id for HTTP/2 over TLS.
pub const ALPN_H2: &[u8] = b"h2";
/// ALPN protocol id for HTTP/1.1.
pub const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Read certificate and key files and build an acceptor.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor> {
    let cert_pem = std::fs::read(cert_path)
        .map_err(|e| Error::tls(format!("failed to read certificate {:?}: {}", cert_path, e)))?;
    let key_pem = std::fs::read(key_path)
        .map_err(|e| Error::tls(format!("failed to read private key {:?}: {}", key_path, e)))?;

    let config = create_rustls_config(&cert_pem, &key_pem)?;
    Ok(TlsAcceptor::from(config))
}

/// Create rustls ServerConfig from PEM-encoded certificate and key
pub fn create_rustls_config(
    cert_pem: &[u8],
    privkey_pem: &[u8],
) -> Result<Arc<rustls::ServerConfig>> {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &cert_pem[..])
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::tls(format!("failed to parse certificate PEM: {}", e)))?;

    if certs.is_empty() {
        return Err(Error::tls("no certificates found in PEM"));
    }

    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &privkey_pem[..])
        .map_err(|e| Error::tls(format!("failed to parse private key PEM: {}", e)))?
        .ok_or_else(|| Error::tls("no private key found in PEM"))?;

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| Error::tls(format!("failed to create rustls server config: {}", e)))?;

    config.alpn_protocols = vec![ALPN_H2.to_vec(), ALPN_HTTP11.to_vec()];

    Ok(Arc::new(config))
}

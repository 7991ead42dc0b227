//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which writes segment files into a temp directory,
//! builds the catalog from it and the full [`AppContext`]. The
//! [`TestHarness::with_server`], [`TestHarness::with_h2_server`] and
//! [`TestHarness::with_tls_server`] constructors start real listeners on
//! random ports.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use pushcast::catalog::ResourceCatalog;
use pushcast::config::Config;
use pushcast::server::{create_router, http2, serve_plaintext, serve_tls, tls, AppContext};
use rustls::pki_types::CertificateDer;
use tempfile::TempDir;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;

/// Test harness wrapping an [`AppContext`] backed by a temp segment directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Create segment files named `names` (contents: `data:<name>`) and build
    /// the context over them with the default `public` mount and `.m4s` suffix.
    pub fn with_segments(names: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        for name in names {
            std::fs::write(dir.path().join(name), segment_contents(name))
                .expect("failed to write segment");
        }

        let mut config = Config::default();
        config.catalog.directory = dir.path().to_path_buf();

        let catalog = ResourceCatalog::build(
            &config.catalog.directory,
            &config.catalog.mount,
            &config.catalog.suffix,
        )
        .expect("failed to build catalog");

        Self {
            ctx: AppContext::new(config, catalog),
            dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start the plaintext listener on a random port.
    pub async fn with_server(names: &[&str]) -> (Self, SocketAddr) {
        let harness = Self::with_segments(names);
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            serve_plaintext(listener, app, CancellationToken::new())
                .await
                .ok();
        });

        (harness, addr)
    }

    /// Start a cleartext HTTP/2 listener driven by the push-capable
    /// connection driver on a random port.
    pub async fn with_h2_server(names: &[&str]) -> (Self, SocketAddr) {
        let harness = Self::with_segments(names);
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let app = app.clone();
                tokio::spawn(async move {
                    http2::serve_connection(stream, app).await.ok();
                });
            }
        });

        (harness, addr)
    }

    /// Start the TLS listener with a fresh self-signed `localhost`
    /// certificate on a random port. Returns the certificate for the client
    /// to trust.
    pub async fn with_tls_server(names: &[&str]) -> (Self, SocketAddr, CertificateDer<'static>) {
        let harness = Self::with_segments(names);
        let app = harness.router();

        let key = rcgen::KeyPair::generate().expect("failed to generate key");
        let cert = rcgen::CertificateParams::new(vec!["localhost".to_string()])
            .expect("invalid certificate params")
            .self_signed(&key)
            .expect("failed to self-sign certificate");
        let config = tls::create_rustls_config(cert.pem().as_bytes(), key.serialize_pem().as_bytes())
            .expect("failed to build TLS config");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(serve_tls(
            listener,
            TlsAcceptor::from(config),
            app,
            CancellationToken::new(),
        ));

        (harness, addr, cert.der().clone())
    }
}

pub fn segment_contents(name: &str) -> Vec<u8> {
    format!("data:{name}").into_bytes()
}

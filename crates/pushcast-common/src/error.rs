//! Common error types used throughout pushcast.
//!
//! Every variant here is fatal to start-up. Per-request failures (a client
//! without push support, a single failed push) are handled where they occur
//! and never surface as one of these.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Common error type for pushcast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The listen address or configuration is missing or invalid.
    #[error("Invalid startup configuration: {0}")]
    StartupConfig(String),

    /// The resource directory could not be read.
    #[error("Failed to build resource catalog from {path:?}: {source}")]
    CatalogBuild {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A network listener failed to bind.
    #[error("Failed to bind listener on {addr}: {source}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or private key material could not be loaded.
    #[error("TLS error: {0}")]
    Tls(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new StartupConfig error.
    pub fn startup_config<S: Into<String>>(msg: S) -> Self {
        Self::StartupConfig(msg.into())
    }

    /// Create a new CatalogBuild error for `path`.
    pub fn catalog_build<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::CatalogBuild {
            path: path.into(),
            source,
        }
    }

    /// Create a new ListenerBind error for `addr`.
    pub fn listener_bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::ListenerBind { addr, source }
    }

    /// Create a new Tls error.
    pub fn tls<S: Into<String>>(msg: S) -> Self {
        Self::Tls(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

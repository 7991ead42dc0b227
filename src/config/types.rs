use pushcast_common::paths::DEFAULT_SEGMENT_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address; the positional CLI argument always overrides this
    #[serde(default)]
    pub host: Option<String>,

    /// Plaintext (HTTP/1.1 and h2c) port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// TLS port; HTTP/2 with server push is negotiated here
    #[serde(default = "default_https_port")]
    pub https_port: u16,
}

fn default_http_port() -> u16 {
    8080
}
fn default_https_port() -> u16 {
    4430
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            http_port: default_http_port(),
            https_port: default_https_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// PEM certificate chain
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,

    /// PEM private key (PKCS#1, PKCS#8 or SEC1)
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("server.crt")
}
fn default_key_path() -> PathBuf {
    PathBuf::from("server.key")
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Directory scanned for segments at start-up and served as static files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// URL mount name; segments are served under `/<mount>/<file name>`
    #[serde(default = "default_mount")]
    pub mount: String,

    /// File name suffix of pushable segments
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("public")
}
fn default_mount() -> String {
    "public".to_string()
}
fn default_suffix() -> String {
    DEFAULT_SEGMENT_SUFFIX.to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            mount: default_mount(),
            suffix: default_suffix(),
        }
    }
}

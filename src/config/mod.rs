mod types;

pub use types::*;

use anyhow::{Context, Result};
use pushcast_common::Error;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./pushcast.toml",
        "~/.config/pushcast/config.toml",
        "/etc/pushcast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.http_port == 0 || config.server.https_port == 0 {
        return Err(Error::startup_config("Server ports cannot be 0").into());
    }

    if config.server.http_port == config.server.https_port {
        return Err(Error::startup_config(format!(
            "Plaintext and TLS listeners cannot share port {}",
            config.server.http_port
        ))
        .into());
    }

    let mount = config.catalog.mount.trim_matches('/');
    if mount.is_empty() || mount.contains('/') {
        return Err(Error::startup_config(format!(
            "Catalog mount must be a single path segment, got {:?}",
            config.catalog.mount
        ))
        .into());
    }

    if config.catalog.suffix.is_empty() {
        return Err(Error::startup_config("Catalog suffix cannot be empty").into());
    }

    if !config.catalog.directory.exists() {
        tracing::warn!(
            "Catalog directory does not exist: {:?}",
            config.catalog.directory
        );
    }

    Ok(())
}

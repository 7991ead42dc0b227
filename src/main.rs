mod cli;

use pushcast::{config, server};

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // A missing listen address exits here with the usage message.
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "pushcast=trace,tower_http=debug".to_string()
        } else {
            "pushcast=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;

    // CLI flags take precedence over the config file
    config.server.host = Some(cli.host.clone());
    if let Some(dir) = cli.public_dir {
        config.catalog.directory = dir;
    }
    if let Some(cert) = cli.cert {
        config.tls.cert_path = cert;
    }
    if let Some(key) = cli.key {
        config.tls.key_path = key;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting pushcast on {}", cli.host);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(server::start_server(config));
    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

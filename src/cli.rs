use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pushcast")]
#[command(author, version, about = "Serve media segments over HTTP/2 server push")]
pub struct Cli {
    /// Address to listen on, e.g. 0.0.0.0 or 127.0.0.1
    pub host: String,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory of segments to scan and serve
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// PEM certificate for the TLS listener
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// PEM private key for the TLS listener
    #[arg(long)]
    pub key: Option<PathBuf>,
}

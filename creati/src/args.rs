use std::path::PathBuf;

use clap::Parser;

/// CreatiAI generation gateway
#[derive(Debug, Parser)]
#[command(name = "creati", about = "Proxy for chat, code, image, music and video generation")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "creati.toml", env = "CREATI_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CREATI_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,

    /// Log filter directive (e.g. "info" or "creati_generation=debug")
    #[arg(long, default_value = "info", env = "CREATI_LOG")]
    pub log: String,
}

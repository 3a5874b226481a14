//! cdn-proxy - policy-gated reverse proxy for a fixed CDN origin.
//!
//! Entry point: parse CLI arguments, load and validate configuration,
//! initialize tracing, bind the listener, and run the server.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cdn_proxy::config::{load_config, ProxyConfig};
use cdn_proxy::http::HttpServer;
use cdn_proxy::lifecycle::Shutdown;

#[derive(Parser, Debug)]
#[command(name = "cdn-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults apply when omitted)
    #[arg(short, long, env = "CDN_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cdn_proxy={},tower_http=warn", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        list_mode = ?config.list_mode,
        max_file_size_mb = config.max_file_size_mb,
        "Starting cdn-proxy"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

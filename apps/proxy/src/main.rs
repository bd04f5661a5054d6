use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fn_relay_common::constants::RELAY_TIMEOUT_SECS;
use fn_relay_common::{Credentials, Envelope, TunnelClient};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod server;
mod transport;

use transport::ReqwestRelay;

/// CLI arguments for the intercepting proxy
#[derive(Parser, Debug)]
#[command(name = "frp")]
#[command(about = "Local HTTP proxy that tunnels requests through a function relay", long_about = None)]
#[command(version)]
struct Args {
    /// Address the proxy listens on
    #[arg(short, long, env = "FRP_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Relay endpoint URL
    #[arg(short, long, env = "FRP_SERVER")]
    server: String,

    /// Shared identifier sent as X-User
    #[arg(short, long, env = "FRP_USER", default_value = "")]
    user: String,

    /// Shared encryption secret
    #[arg(short, long, env = "FRP_KEY", default_value = "", hide_env_values = true)]
    key: String,

    /// Relay request timeout in seconds
    #[arg(long, default_value_t = RELAY_TIMEOUT_SECS)]
    request_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Configuration for the proxy
#[derive(Debug, Clone)]
pub struct Config {
    /// Local listen address
    pub listen: SocketAddr,

    /// Relay endpoint
    pub server: Url,

    /// Identifier and secret shared with the relay
    pub credentials: Credentials,

    /// Timeout for one relay round trip
    pub request_timeout: Duration,
}

impl Config {
    fn from_args(args: Args) -> Result<Self> {
        let server = Url::parse(&args.server)
            .with_context(|| format!("Invalid relay endpoint: {}", args.server))?;
        if !matches!(server.scheme(), "http" | "https") {
            bail!("Relay endpoint must be http or https, got {}", server.scheme());
        }

        Ok(Self {
            listen: args.listen,
            server,
            credentials: Credentials::new(args.user, args.key),
            request_timeout: Duration::from_secs(args.request_timeout),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("fn-relay proxy v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_args(args)?;
    if config.credentials.user.is_empty() {
        warn!("No identifier configured; the relay must accept an empty X-User");
    }

    let transport = ReqwestRelay::new(config.server.as_str(), config.request_timeout)
        .context("Failed to build relay client")?;
    let cipher = Envelope::new(config.credentials.key.clone());
    let tunnel = Arc::new(TunnelClient::new(
        transport,
        cipher,
        config.credentials.user.clone(),
    ));

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    info!("Listening on {}", config.listen);
    info!("Relay endpoint: {}", config.server);

    // Run until interrupted
    tokio::select! {
        result = server::serve(listener, tunnel) => {
            error!("Proxy listener exited: {:?}", result);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down gracefully...");
        }
    }

    Ok(())
}

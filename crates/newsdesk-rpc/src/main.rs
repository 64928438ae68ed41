//! Newsdesk RPC Server - procedure bridge and server-rendered pages.

use anyhow::Result;
use clap::Parser;
use newsdesk_core::config::{BridgeConfig, QueryConfig};
use newsdesk_core::QueryClientConfig;
use newsdesk_rpc::{start_server, HomeVariant, ServerConfig};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "newsdesk-rpc")]
#[command(about = "HTTP server for Newsdesk")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path prefix of the RPC endpoint
    #[arg(long, default_value = BridgeConfig::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Staleness window of server-side queries, in milliseconds
    #[arg(long, default_value_t = QueryConfig::STALE_TIME.as_millis() as u64)]
    stale_time_ms: u64,

    /// Page rendered at /
    #[arg(long, value_enum, default_value_t = HomeVariant::News)]
    home: HomeVariant,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides the level flag
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Newsdesk RPC Server");

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        endpoint: args.endpoint,
        query: QueryClientConfig::default()
            .with_stale_time(Duration::from_millis(args.stale_time_ms)),
        home: args.home,
    };

    let addr = start_server(config).await?;

    // Print port for the parent process to read (intentional stdout)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}

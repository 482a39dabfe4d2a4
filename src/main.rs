//! Stock report proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                STOCK REPORT PROXY                │
//!   Browser request      │  ┌────────┐   ┌──────────┐   ┌───────────────┐   │
//!   ─────────────────────┼─▶│  http  │──▶│ handlers │──▶│    report     │   │
//!                        │  │ server │   │          │   │  aggregator   │   │
//!                        │  └────────┘   └────┬─────┘   └──────┬────────┘   │
//!                        │                    │                │            │
//!                        │                    ▼                ▼            │
//!                        │              ┌─────────────────────────────┐     │
//!                        │              │  providers (financial, AI)  │─────┼──▶ Alpha Vantage
//!                        │              │  + resilience (retry/backoff)│─────┼──▶ Gemini
//!                        │              └─────────────────────────────┘     │
//!                        │                                                  │
//!                        │  config · credentials · observability · lifecycle│
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use stock_report_proxy::config::{self, Credentials};
use stock_report_proxy::observability::{logging, metrics};
use stock_report_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "stock-report-proxy")]
#[command(about = "Proxy for financial-data and generative-text providers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "STOCK_REPORT_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Seed the environment from .env before anything reads it.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = config::load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("stock-report-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let credentials = Credentials::from_env();
    credentials.log_summary();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_attempts = config.retries.max_attempts,
        base_delay_ms = config.retries.base_delay_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, credentials);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

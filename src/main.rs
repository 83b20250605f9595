//! healthz-server
//!
//! Serves `/healthz` and exits cleanly on SIGHUP, SIGINT, SIGTERM or SIGQUIT.
//!
//! ```text
//!   config (TOML / flags)
//!        │
//!        ▼
//!   ┌──────────┐  register   ┌───────────────┐
//!   │  Server  │◀────────────│HealthResponder│
//!   └────┬─────┘             └───────────────┘
//!        │ run: listener task + wait(signal | token)
//!        ▼
//!   stop: drain in-flight requests → release socket
//! ```

use std::path::PathBuf;

use clap::Parser;

use healthz_server::config::{load_config, ServerConfig};
use healthz_server::observability::{logging, metrics};
use healthz_server::{HealthResponder, Server};

#[derive(Parser)]
#[command(name = "healthz-server")]
#[command(about = "HTTP health endpoint with graceful, signal-aware shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. ":8080").
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        shutdown_timeout_secs = config.shutdown.timeout_secs,
        health_path = %config.health.path,
        "healthz-server starting"
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

    let mut server = Server::from_config(&config);
    server.register([HealthResponder::from_config(&config.health).route_at(config.health.path.clone())]);

    let outcome = server.run().await;
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "Server failed");
    }

    server.stop().await?;
    outcome?;

    tracing::info!("Shutdown complete");
    Ok(())
}

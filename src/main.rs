//! `burrow`: serve a directory over the burrow line protocol.
//!
//! ```text
//! burrow [ROOT] [--host HOST] [--port PORT]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `burrow=info`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use burrow::config::{Config, DEFAULT_HOST, DEFAULT_PORT};
use burrow::server::Server;

#[derive(Debug, Parser)]
#[command(
    name = "burrow",
    version,
    about = "Serve a directory over a line-oriented TCP protocol"
)]
struct Cli {
    /// Directory to serve (defaults to the current directory)
    root: Option<PathBuf>,

    /// Interface to listen on
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "burrow=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match cli.root {
        Some(root) => Config::new(root),
        None => Config::current_dir(),
    };
    let config = match config {
        Ok(config) => config.listen_on(&cli.host, cli.port),
        Err(e) => {
            error!(error = %e, "cannot serve root directory");
            return ExitCode::FAILURE;
        }
    };

    info!(root = %config.root().display(), "hosting directory");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start listener");
            return ExitCode::FAILURE;
        }
    };

    match server.run_until(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

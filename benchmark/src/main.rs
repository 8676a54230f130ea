//! @ai:module:intent CLI for the benchmark tracking service
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use benchmark_service::{
    api::{serve, AppState},
    config::ServiceConfig,
    store::SqliteStore,
    tracker::BenchmarkTracker,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "benchmark-service")]
#[command(about = "Records benchmark runs, their executions and measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file (overrides config)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark-service.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("benchmark_service=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            port,
            database,
        } => {
            let mut config = load_or_default_config(config)?;

            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(database) = database {
                config.storage.database_path = database;
            }

            run_server(config).await
        }
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Open storage, bind the listener and serve until Ctrl-C
/// @ai:effects network, fs:read, fs:write
async fn run_server(config: ServiceConfig) -> Result<()> {
    let store = SqliteStore::open(&config.storage.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.storage.database_path.display()
        )
    })?;

    let tracker = Arc::new(BenchmarkTracker::new(Arc::new(store)));
    let state = AppState::new(tracker, config.paging.clone());

    let address = config.server.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    serve(listener, state, shutdown_signal()).await
}

/// @ai:intent Resolve when the process receives Ctrl-C
/// @ai:effects signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

/// @ai:intent Load config from path or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<ServiceConfig> {
    match path {
        Some(p) => ServiceConfig::load(&p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => {
            let default_path = PathBuf::from("benchmark-service.toml");

            if default_path.exists() {
                ServiceConfig::load(&default_path)
            } else {
                Ok(ServiceConfig::default())
            }
        }
    }
}

/// @ai:intent Write the default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    if output.exists() {
        anyhow::bail!("Config file already exists: {}", output.display());
    }

    let config = ServiceConfig::default();
    config.save(&output)?;

    println!("Created configuration file: {}", output.display());
    Ok(())
}

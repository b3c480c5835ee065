//! Catalog Server - Main entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_api::AppState;
use catalog_storage::{MemoryStore, ProductStore};
use catalog_storage_sqlite::{Bootstrap, SqliteConfig, SqliteStore, DEFAULT_DATABASE, DEFAULT_TABLE};

/// Storage backend choice, fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Transient in-process catalog, seeded on startup
    Memory,
    /// SQLite database, created and seeded on first run
    Sqlite,
}

#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(about = "Product catalog REST server")]
#[command(version)]
struct Cli {
    /// Storage backend
    #[arg(long, value_enum, default_value = "sqlite", env = "CATALOG_BACKEND")]
    backend: Backend,

    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000", env = "CATALOG_BIND_ADDRESS")]
    bind: String,

    /// SQLite database file
    #[arg(long, default_value = DEFAULT_DATABASE, env = "CATALOG_DATABASE")]
    database: PathBuf,

    /// Catalog table name
    #[arg(long, default_value = DEFAULT_TABLE, env = "CATALOG_TABLE")]
    table: String,
}

/// Opens the selected backend and runs its bootstrap.
async fn open_store(cli: &Cli) -> Result<Arc<dyn ProductStore>> {
    match cli.backend {
        Backend::Memory => {
            warn!("In-memory backend selected - data is lost on shutdown");
            Ok(Arc::new(MemoryStore::seeded()))
        },
        Backend::Sqlite => {
            let config = SqliteConfig {
                database: cli.database.clone(),
                table: cli.table.clone(),
            };

            let store = SqliteStore::open(&config)
                .await
                .with_context(|| format!("failed to open {}", config.database.display()))?;

            match store.bootstrap().await {
                Ok(Bootstrap::AlreadyExists) => {},
                Ok(Bootstrap::Created { seeded }) => {
                    info!(table = %config.table, seeded, "Catalog table initialized");
                },
                Err(e) => {
                    cleanup(&store).await;
                    return Err(e).context("failed to bootstrap catalog table");
                },
            }

            Ok(Arc::new(store))
        },
    }
}

/// Best-effort teardown; failures are logged and never escalated.
async fn cleanup(store: &dyn ProductStore) {
    if let Err(e) = store.cleanup().await {
        error!(backend = store.name(), error = %e, "Cleanup failed");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!("Starting catalog server...");
    info!(backend = ?cli.backend, "Initializing storage");

    let store = open_store(&cli).await?;

    let listener = match tokio::net::TcpListener::bind(&cli.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            cleanup(store.as_ref()).await;
            return Err(e).with_context(|| format!("failed to bind {}", cli.bind));
        },
    };

    info!("Bind address: {}", cli.bind);

    let app = catalog_api::router(AppState::new(store.clone()));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cleanup(store.as_ref()).await;
    served.context("server error")?;

    info!("Catalog server stopped");
    Ok(())
}

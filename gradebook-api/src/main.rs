//! Gradebook API - Main entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gradebook_api::{build_router, AppState};
use gradebook_common::config::{ConfigOverrides, RootFolderInitializer, ServiceConfig, TomlConfig};
use gradebook_common::db::init_database;

/// Command-line arguments for gradebook-api
#[derive(Parser, Debug)]
#[command(name = "gradebook-api")]
#[command(about = "REST service for students, subjects, notes and weighted averages")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "GRADEBOOK_PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "GRADEBOOK_HOST")]
    host: Option<String>,

    /// Root folder holding the database and exports
    #[arg(short, long, env = "GRADEBOOK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Database file (default: <root>/gradebook.db)
    #[arg(long, env = "GRADEBOOK_DATABASE")]
    database: Option<PathBuf>,

    /// Export directory (default: <root>/exports)
    #[arg(long, env = "GRADEBOOK_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "GRADEBOOK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // An explicitly named config file must load
    let toml = match &args.config {
        Some(path) => Some(TomlConfig::load(path).context("Failed to load config file")?),
        None => TomlConfig::load_default(),
    };

    let config = ServiceConfig::resolve(
        ConfigOverrides {
            root_folder: args.root_folder,
            database_path: args.database,
            export_dir: args.export_dir,
            host: args.host,
            port: args.port,
            log_level: None,
        },
        toml.as_ref(),
    );

    let default_filter = format!(
        "gradebook_api={level},gradebook_common={level},tower_http={level}",
        level = config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting gradebook-api v{}",
        env!("CARGO_PKG_VERSION")
    );
    if args.config.is_none() && toml.is_none() {
        info!("No config file, using defaults");
    }

    let initializer = RootFolderInitializer::new(config.root_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    info!("Database: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    info!("Export directory: {}", config.export_dir.display());
    let app = build_router(AppState::new(pool, config.export_dir.clone()));

    let addr = config.bind_addr();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

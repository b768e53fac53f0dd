use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forum_link_ledger::config::Config;
use forum_link_ledger::db::{self, Database};
use forum_link_ledger::ingest::IngestService;
use forum_link_ledger::web;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Logging depends on the configuration, so failures up to here go to stderr
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Fatal error: {e:#}");
            std::process::exit(1);
        }
    };
    if let Err(e) = init_tracing(config.log_file.as_deref()) {
        eprintln!("Fatal error: {e:#}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    info!("Starting forum-link-ledger");
    info!(database = %config.database_path.display(), "Configuration loaded");

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }

    let db = Database::new(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let forum_urls = db::count_forum_urls(db.pool()).await?;
    let other_urls = db::count_other_urls(db.pool()).await?;
    info!(forum_urls, other_urls, "Database initialized");

    // The dedup cache must be complete before the first submission arrives.
    let ingest = IngestService::new(db)
        .await
        .context("Failed to rebuild dedup cache")?
        .with_max_urls(config.max_urls_per_submission);

    web::serve(&config, ingest, shutdown_signal()).await?;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forum_link_ledger=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Plain-text copy of the log, truncated on every start
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down...");
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{router, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "agency-os")]
#[command(about = "Agency OS - clients, projects and tasks for small agencies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the web server (default)")]
    Serve {
        #[arg(long, help = "Bind address, overrides APP_HOST")]
        host: Option<String>,

        #[arg(long, help = "Port, overrides APP_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn serve(config: &AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    config.validate()?;
    if let Some(url) = config.redacted_database_url() {
        info!("Using database {}", url);
    }

    let store = DatabaseManager::open_store(config).await?;
    let state = AppState::new(store, config).context("failed to load page templates")?;
    let app = router(state);

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Agency OS listening on http://{}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

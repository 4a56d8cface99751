use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agency_os::cli::{self, Cli};
use agency_os::{config, is_development, is_production};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and JWT_SECRET are picked up
    let _ = dotenvy::dotenv();

    let default_filter = if is_production!() {
        "agency_os=info,tower_http=info"
    } else {
        "agency_os=debug,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::config();
    tracing::info!("Starting Agency OS in {:?} mode", config.environment);
    if is_development!() && std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set; signing sessions with the development secret");
    }

    cli::run(Cli::parse(), config).await
}

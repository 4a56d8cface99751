use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AppConfig, DatabaseConfig, Environment};
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::store::RecordStore;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("In-memory store is only available in development")]
    MemoryStoreNotAllowed,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Opens the record store the configuration asks for.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Postgres when `DATABASE_URL` is set, otherwise the in-memory store (development only).
    pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>, DatabaseError> {
        if config.database.url.is_none() {
            if config.environment != Environment::Development {
                return Err(DatabaseError::MemoryStoreNotAllowed);
            }
            warn!("DATABASE_URL not set; using the in-memory record store (data is lost on restart)");
            return Ok(Arc::new(MemoryStore::new()));
        }

        let pool = Self::connect(&config.database).await?;
        if config.database.run_migrations {
            Self::migrate(&pool).await?;
        }
        Ok(Arc::new(PgStore::new(pool)))
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn development_without_url_uses_memory_store() {
        let config = AppConfig::development();
        let store = DatabaseManager::open_store(&config).await.unwrap();
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn production_without_url_is_refused() {
        let config = AppConfig::production();
        assert!(matches!(
            DatabaseManager::open_store(&config).await,
            Err(DatabaseError::MemoryStoreNotAllowed)
        ));
    }
}

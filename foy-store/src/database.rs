use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::app_config::DatabaseConfig;

/// Shared Postgres pool for the ad and payment repositories.
#[derive(Clone)]
pub struct DbClient {
    pub pool: PgPool,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!("Postgres pool ready ({} connections max)", config.max_connections);
        Ok(Self { pool })
    }

    /// Creates the `ads` and `ad_payments` tables if they are missing.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running ads schema migrations");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Ads schema up to date");
        Ok(())
    }
}

//! Postgres access for the price ETL: the connection pool, schema
//! migrations, and the staging tables each pipeline run writes through.

use std::time::Duration;

use petprice_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod staging;
pub mod templates;

pub use staging::{PgStagingStore, Promotion, StagingKind, StagingStore, StagingTable};
pub use templates::{validate_identifier, Template, TemplateParams};

// Resolves to <workspace-root>/migrations/.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const APPLIED_MIGRATIONS: &str = "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true";

/// Pool sizing taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("identifier '{0}' is not allowed in a SQL template")]
    InvalidIdentifier(String),
    #[error("template '{template}' requires parameter '{param}'")]
    MissingTemplateParam {
        template: &'static str,
        param: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open the pool the CLI hands to every pipeline run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the URL is malformed or no connection can be
/// established within the acquire timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await?;
    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Apply pending migrations and return how many ran.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    // A fresh database has no _sqlx_migrations table yet.
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;

    let applied = usize::try_from((after - before).max(0)).unwrap_or(0);
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(APPLIED_MIGRATIONS)
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trip a `SELECT 1`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let config = PoolConfig {
            max_connections: 1,
            min_connections: 0,
            acquire_timeout_secs: 1,
        };

        let err = connect_pool("not a postgres url", config).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
    }
}

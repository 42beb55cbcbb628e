use crate::config::AppConfig;
use crate::errors::ServiceError;
use anyhow::Context;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

pub type DbPool = DatabaseConnection;

/// Pool tuning knobs, sourced from [`AppConfig`] in the binary.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Opens the connection pool described by `config`.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(?config, "Opening database pool");

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(true);

    gauge!(
        "salonstock_db.max_connections",
        config.max_connections as f64
    );

    let pool = Database::connect(opt)
        .await
        .map_err(ServiceError::DatabaseError)
        .context("establishing the database pool")?;

    info!(
        max_connections = config.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Opens a pool tuned by the application config.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&cfg.into()).await
}

/// Applies all pending migrations through the embedded migrator.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Applying migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    match &result {
        Ok(_) => info!(elapsed = ?start.elapsed(), "Migrations applied"),
        Err(e) => error!(elapsed = ?start.elapsed(), "Migrations failed: {e}"),
    }
    result
}

/// Records wall-clock time of one ledger transaction for dashboards.
pub(crate) fn record_transaction_metrics(
    operation: &'static str,
    start: std::time::Instant,
    ok: bool,
) {
    let elapsed = start.elapsed();
    histogram!("salonstock_db.transaction.duration", elapsed, "operation" => operation);
    if ok {
        counter!("salonstock_db.transaction.committed", 1, "operation" => operation);
    } else {
        counter!("salonstock_db.transaction.rolled_back", 1, "operation" => operation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_config_maps_app_config_tuning() {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        );
        cfg.db_max_connections = 7;
        cfg.db_min_connections = 2;
        cfg.db_connect_timeout_secs = 5;
        cfg.db_acquire_timeout_secs = 3;

        let db_cfg: DbConfig = (&cfg).into();
        assert_eq!(db_cfg.url, "sqlite::memory:");
        assert_eq!(db_cfg.max_connections, 7);
        assert_eq!(db_cfg.min_connections, 2);
        assert_eq!(db_cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(db_cfg.acquire_timeout, Duration::from_secs(3));
    }
}

use std::sync::Arc;

use storefront_core::config::{AppConfig, ConfigError, LoadOptions};
use storefront_core::recommendations::RecommendationEngine;
use storefront_db::{
    connect_with_settings, migrations, DbPool, SqlCatalogRepository, SqlInteractionRepository,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<RecommendationEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let engine = RecommendationEngine::from_config(
        Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        Arc::new(SqlInteractionRepository::new(db_pool.clone())),
        &config.recommendations,
    );
    info!(
        event_name = "system.bootstrap.engine_ready",
        cache_enabled = config.recommendations.cache_enabled,
        default_limit = engine.settings().default_limit,
        "recommendation engine initialized"
    );

    Ok(Application { config, db_pool, engine: Arc::new(engine) })
}

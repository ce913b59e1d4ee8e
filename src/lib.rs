pub mod admin; // Doctor / patient / medicine management
pub mod api; // HTTP router, middleware, server
pub mod auth;
pub mod config;
pub mod core_state; // Sessions + audit buffer
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod seed; // Demo clinic for empty databases
pub mod visits; // Visit recording + scoped detail

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Seeding failed: {0}")]
    Seed(#[from] seed::SeedError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Create or upgrade the schema and, when enabled, seed demo data.
///
/// Retried up to `SCHEMA_INIT_ATTEMPTS` times, `interval` apart.
pub async fn initialize_database(
    config: &ServerConfig,
    interval: Duration,
) -> Result<(), StartupError> {
    let mut attempt = 1;
    loop {
        match initialize_once(config) {
            Ok(seeded) => {
                tracing::info!(seeded, "Database initialized");
                return Ok(());
            }
            Err(e) if attempt < config::SCHEMA_INIT_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    attempts = config::SCHEMA_INIT_ATTEMPTS,
                    error = %e,
                    "Database initialization failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(interval).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Database initialization failed");
                return Err(e);
            }
        }
    }
}

fn initialize_once(config: &ServerConfig) -> Result<bool, StartupError> {
    let mut conn = db::open_database(&config.database_path)?;
    if !config.seed_demo_data {
        return Ok(false);
    }
    Ok(seed::populate_demo_data(&mut conn)?)
}

/// Start the clinic service and run until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    tracing::info!(path = %config.database_path.display(), bind = %config.bind_addr, "Configuration loaded");

    db::wait_for_database(
        &config.database_path,
        config.db_connect_retries,
        config.db_retry_interval,
    )
    .await?;
    initialize_database(&config, config.db_retry_interval).await?;

    let core = Arc::new(CoreState::new(config.database_path.clone(), config.session_ttl));
    let mut server = api::start_server(core, config.bind_addr, config.cookie_secure).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}

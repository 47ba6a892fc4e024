pub mod api; // HTTP surface
pub mod booking;
pub mod cache;
pub mod config;
pub mod core_state;
pub mod db;
pub mod group_walk;
pub mod models;
pub mod tracking; // Device sampler, session controller, tracking endpoint

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::{ConfigError, ServerConfig};
use crate::core_state::{CoreError, CoreState};

/// Startup failures surfaced by `run()`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    Server(String),
    #[error("Signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Start the service and block until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = ServerConfig::from_env()?;
    let core = Arc::new(CoreState::open(&settings.db_path)?);
    let ctx = ApiContext::with_dog_cache(
        core,
        settings.dog_cache_ttl,
        settings.dog_cache_capacity,
    );

    let mut server = api::start_server_on(ctx, settings.bind)
        .await
        .map_err(AppError::Server)?;
    tracing::info!(addr = %server.local_addr(), "Listening");

    tokio::signal::ctrl_c().await?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}

/**
 * Server Configuration
 *
 * Loads the hub configuration and the optional PostgreSQL pool backing the
 * language reference data.
 *
 * # Error Handling
 *
 * A missing or unreachable database does not prevent startup: the language
 * cache then serves its built-in table only. An invalid `HubConfig` does,
 * since the hub cannot run with it.
 */

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::shared::{ConfigError, HubConfig};

/// Database pool, if one is configured and reachable
pub type DatabaseConfig = Option<PgPool>;

/// Load `HubConfig` from defaults, `HUB_CONFIG` and the environment
pub fn load_config() -> Result<HubConfig, ConfigError> {
    let config = HubConfig::load()?;
    tracing::info!(
        port = config.port,
        require_auth = config.require_auth,
        priority_languages = config.priority.languages.len(),
        "Hub configuration loaded"
    );
    Ok(config)
}

/// Connect to `DATABASE_URL` if it is set
pub async fn load_database() -> DatabaseConfig {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!("DATABASE_URL not set. Language names will come from the built-in table.");
            return None;
        }
    };

    tracing::info!("Connecting to database...");

    match PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Database connection pool created successfully");
            Some(pool)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create database connection pool");
            tracing::warn!("Language names will come from the built-in table.");
            None
        }
    }
}

//! PostgreSQL pool setup for the direct gateway.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use snipstore_core::config::storage::DatabaseConfig;
use snipstore_core::error::{AppError, AppResult, ErrorKind};

/// Open a sqlx pool sized and timed by `config`.
pub async fn connect_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    info!(
        url = %mask_password(&config.url),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting query gateway to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .connect(&config.url)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to connect to gateway database: {e}"),
                e,
            )
        })?;

    Ok(pool)
}

/// Replace the password in a connection URL with `****` for logging.
pub fn mask_password(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let userinfo_start = url.find("://").map_or(0, |p| p + 3);
    match url[userinfo_start..at].find(':') {
        Some(offset) => {
            let colon = userinfo_start + offset;
            format!("{}:****{}", &url[..colon], &url[at..])
        }
        None => url.to_string(),
    }
}

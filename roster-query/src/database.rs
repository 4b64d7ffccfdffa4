//! Database connection pool management

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::DatabaseConfig;
use crate::error::{ExecutionError, Result};

/// Create a SQLite connection pool, retrying with exponential backoff
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let mut attempt = 0;
    let base_delay = config.retry_delay();

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Database connection pool created: max={}, min={}",
                        config.max_connections,
                        config.min_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to database after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e.into());
                }

                let delay = base_delay * 2_u32.saturating_pow(attempt - 1);
                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_create_pool(config: &DatabaseConfig) -> std::result::Result<SqlitePool, ExecutionError> {
    let mut options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout());

    // Each in-memory connection is its own database; keep the first one alive
    if is_in_memory(&config.url) {
        options = options.idle_timeout(None).max_lifetime(None);
    }

    options.connect(&config.url).await.map_err(|e| {
        ExecutionError::connection_failed(format!(
            "Failed to connect to database at '{}': {} ({})",
            sanitize_connection_url(&config.url),
            categorize_db_error(&e),
            e
        ))
    })
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Sanitize connection URL for safe logging (remove password)
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) {
        let credentials_start = scheme_end + 3;
        if at_pos > credentials_start {
            if let Some(colon) = url[credentials_start..at_pos].find(':') {
                let user = &url[credentials_start..credentials_start + colon];
                return format!("{}{}:***{}", &url[..credentials_start], user, &url[at_pos..]);
            }
        }
    }
    url.to_string()
}

/// Short human-readable category for a connection failure
fn categorize_db_error(err: &sqlx::Error) -> &'static str {
    use sqlx::Error;
    match err {
        Error::Configuration(_) => "Configuration error",
        Error::Database(_) => "Database error",
        Error::Io(_) => "I/O error - check the database path and permissions",
        Error::PoolTimedOut => "Connection pool timeout",
        Error::PoolClosed => "Connection pool closed",
        Error::WorkerCrashed => "Database worker crashed",
        _ => "Connection error",
    }
}

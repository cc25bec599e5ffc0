// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use jobmatch_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// In-memory databases are per-connection, so they get a single connection
const MEMORY_URL_PREFIX: &str = "sqlite::memory:";

/// Create SQLite connection pool with WAL mode and a busy timeout
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("invalid database url '{database_url}': {e}")))?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let max_connections = if database_url.starts_with(MEMORY_URL_PREFIX) {
        1
    } else {
        10
    };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}

/// Pool for a database file path, creating parent directories
pub async fn open_database(path: &std::path::Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    create_pool(&format!("sqlite://{}", path.display())).await
}

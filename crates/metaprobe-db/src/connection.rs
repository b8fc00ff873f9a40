//! Database connection management.
//!
//! Opens the `SQLx` connection pool shared by all scan workers. File-backed
//! databases run in WAL mode with a busy timeout so concurrent jobs queue
//! their writes instead of failing on lock contention.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Maximum pooled connections.
const MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits for the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a connection pool at `path` (or `:memory:` for an in-memory database).
///
/// # Errors
/// Returns `DatabaseError::Open` if:
/// - The path is not valid UTF-8
/// - The parent directory cannot be created
/// - The database file cannot be opened
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| DatabaseError::Open("invalid database path: not valid UTF-8".to_string()))?;

    let in_memory = path_str == ":memory:";
    let connect_options = if in_memory {
        SqliteConnectOptions::from_str(path_str)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DatabaseError::Open(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        SqliteConnectOptions::new()
            .filename(path)
            .journal_mode(SqliteJournalMode::Wal)
    };

    let connect_options = connect_options
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true);

    // every in-memory connection is a separate database
    let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

    tracing::info!("Database pool opened at {}", path_str);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_pool() {
        let pool = open_pool(":memory:").await.expect("open in-memory pool");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("pool answers queries");
        pool.close().await;
    }

    #[tokio::test]
    async fn test_open_file_pool_creates_parent() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = tmp.path().join("nested").join("store.db");

        let pool = open_pool(&path).await.expect("open file pool");
        assert!(path.exists());
        pool.close().await;
    }
}

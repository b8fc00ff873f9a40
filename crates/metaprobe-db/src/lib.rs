//! Metaprobe Artifact Store
//!
//! Persists one record per downloaded file in `SQLite`, keyed by the file's
//! URL. Uses `SQLx` for pooled access and embedded migrations.
//!
//! # Architecture
//!
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Connection Pooling**: shared pool, WAL journal for file databases
//! - **Deduplication**: a unique index on `url` backs [`artifacts::insert_if_absent`]
//!
//! # Example
//!
//! ```ignore
//! use metaprobe_db::Database;
//!
//! let db = Database::new("metaprobe.db").await?;
//! db.run_migrations().await?;
//! let records = db.list_by_domain("example.com").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod artifacts;
pub mod connection;
pub mod error;
pub mod migrations;

pub use artifacts::{ArtifactFilter, InsertOutcome, PurgeSummary, Totals};
pub use error::{DatabaseError, Result};

use metaprobe_core::{ArtifactRecord, NewArtifact};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level store handle.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the store at `path`, or `:memory:` for an in-memory store.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Open the store at `path` and bring its schema up to date.
    ///
    /// # Errors
    /// Returns `DatabaseError` if opening or migrating fails.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Whether a record exists for `url`.
    pub async fn artifact_exists(&self, url: &str) -> Result<bool> {
        Ok(artifacts::exists(&self.pool, url).await?)
    }

    /// Insert a record unless its URL is already stored.
    pub async fn insert_artifact(&self, artifact: NewArtifact) -> Result<InsertOutcome> {
        artifacts::insert_if_absent(&self.pool, artifact).await
    }

    /// All records filed under `domain`.
    pub async fn list_by_domain(&self, domain: &str) -> Result<Vec<ArtifactRecord>> {
        artifacts::list_by_domain(&self.pool, domain).await
    }

    /// Records matching `filter`.
    pub async fn list_artifacts(&self, filter: &ArtifactFilter) -> Result<Vec<ArtifactRecord>> {
        artifacts::list(&self.pool, filter).await
    }

    /// Delete a domain's records and their backing files.
    pub async fn purge_domain(&self, domain: &str) -> Result<PurgeSummary> {
        artifacts::purge_domain(&self.pool, domain).await
    }

    /// Store-wide file count and byte total.
    pub async fn totals(&self) -> Result<Totals> {
        Ok(artifacts::totals(&self.pool).await?)
    }
}

//! Artifact records: dedup lookup, insert-if-absent, listing and purge.
//!
//! The `url` column carries a unique index, and inserts go through
//! `INSERT ... ON CONFLICT(url) DO NOTHING`, so two workers racing on the
//! same URL produce exactly one row no matter how their `exists` checks
//! interleave.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use metaprobe_core::{ArtifactRecord, MetadataRecord, NewArtifact};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use std::io::ErrorKind;

const SELECT_COLUMNS: &str =
    "SELECT id, domain, url, local_path, filename, extension, filesize, scanned_at, metadata_json
     FROM artifacts";

/// Outcome of [`insert_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted(ArtifactRecord),
    /// A record for the same URL already existed; nothing was written.
    Duplicate,
}

/// Filter for [`list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactFilter {
    /// Only records filed under this domain
    pub domain: Option<String>,
    /// Case-insensitive substring searched in filename, URL and metadata.
    /// Case folding covers all of Unicode, not just ASCII.
    pub text_query: Option<String>,
}

impl ArtifactFilter {
    /// Filter on a single domain.
    #[must_use]
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            text_query: None,
        }
    }
}

/// Result of purging a domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    /// Rows deleted from the store
    pub records_deleted: u64,
    /// Backing files removed from disk
    pub files_removed: u64,
    /// Backing files that could not be removed (missing files excluded)
    pub file_errors: u64,
}

/// Store-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Number of recorded files
    pub total_files: u64,
    /// Sum of recorded file sizes
    pub total_bytes: u64,
}

/// Check whether a record exists for this exact URL.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn exists(pool: &Pool<Sqlite>, url: &str) -> std::result::Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM artifacts WHERE url = ? LIMIT 1")
        .bind(url)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Insert a record unless one already exists for the same URL.
///
/// # Errors
/// Returns `DatabaseError` if metadata cannot be serialized or the write fails.
pub async fn insert_if_absent(pool: &Pool<Sqlite>, params: NewArtifact) -> Result<InsertOutcome> {
    let scanned_at = Utc::now();
    let metadata_json = serde_json::to_string(&params.metadata)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
    let filesize = i64::try_from(params.filesize).map_err(|_| {
        DatabaseError::SerializationError(format!("file size {} out of range", params.filesize))
    })?;

    let result = sqlx::query(
        "INSERT INTO artifacts (domain, url, local_path, filename, extension, filesize, scanned_at, metadata_json)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(url) DO NOTHING",
    )
    .bind(&params.domain)
    .bind(&params.url)
    .bind(&params.local_path)
    .bind(&params.filename)
    .bind(&params.extension)
    .bind(filesize)
    .bind(scanned_at.to_rfc3339())
    .bind(&metadata_json)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!("Artifact already recorded: {}", params.url);
        return Ok(InsertOutcome::Duplicate);
    }

    Ok(InsertOutcome::Inserted(ArtifactRecord {
        id: result.last_insert_rowid(),
        domain: params.domain,
        url: params.url,
        local_path: params.local_path,
        filename: params.filename,
        extension: params.extension,
        filesize: params.filesize,
        scanned_at,
        metadata: params.metadata,
    }))
}

/// Fetch the record for a URL, if any.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row cannot be decoded.
pub async fn get_by_url(pool: &Pool<Sqlite>, url: &str) -> Result<Option<ArtifactRecord>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE url = ?"))
        .bind(url)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_artifact).transpose()
}

/// All records filed under a domain, newest first.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row cannot be decoded.
pub async fn list_by_domain(pool: &Pool<Sqlite>, domain: &str) -> Result<Vec<ArtifactRecord>> {
    list(pool, &ArtifactFilter::domain(domain)).await
}

/// Records matching an optional domain and text filter, newest first.
///
/// ASCII queries are matched in SQL with `LIKE`. SQLite only folds ASCII
/// case, so a query containing other characters (`CONTRASEÑA`) is matched
/// here instead, against Unicode-lowercased columns.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or a row cannot be decoded.
pub async fn list(pool: &Pool<Sqlite>, filter: &ArtifactFilter) -> Result<Vec<ArtifactRecord>> {
    let query = filter
        .text_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    let (pattern, folded) = match query {
        Some(q) if q.is_ascii() => (Some(like_pattern(q)), None),
        Some(q) => (None, Some(q.to_lowercase())),
        None => (None, None),
    };

    let rows = sqlx::query(&format!(
        "{SELECT_COLUMNS}
         WHERE (?1 IS NULL OR domain = ?1)
           AND (?2 IS NULL
                OR filename LIKE ?2 ESCAPE '\\'
                OR url LIKE ?2 ESCAPE '\\'
                OR metadata_json LIKE ?2 ESCAPE '\\')
         ORDER BY scanned_at DESC, id DESC"
    ))
    .bind(filter.domain.as_deref())
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(needle) = &folded {
            if !row_contains_folded(row, needle)? {
                continue;
            }
        }
        records.push(row_to_artifact(row)?);
    }
    Ok(records)
}

fn row_contains_folded(row: &SqliteRow, needle: &str) -> Result<bool> {
    for column in ["filename", "url", "metadata_json"] {
        let value: String = row.try_get(column)?;
        if value.to_lowercase().contains(needle) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Number of records filed under a domain.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn count_by_domain(
    pool: &Pool<Sqlite>,
    domain: &str,
) -> std::result::Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE domain = ?")
        .bind(domain)
        .fetch_one(pool)
        .await?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Delete every record of a domain and remove their backing files.
///
/// Rows are deleted in one statement; file removal afterwards is
/// best-effort and individual failures only increment `file_errors`.
///
/// # Errors
/// Returns `DatabaseError` if the delete statement fails.
pub async fn purge_domain(pool: &Pool<Sqlite>, domain: &str) -> Result<PurgeSummary> {
    let paths: Vec<String> =
        sqlx::query_scalar("DELETE FROM artifacts WHERE domain = ? RETURNING local_path")
            .bind(domain)
            .fetch_all(pool)
            .await?;

    let mut summary = PurgeSummary {
        records_deleted: paths.len() as u64,
        ..PurgeSummary::default()
    };

    for path in &paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => summary.files_removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Backing file already gone: {}", path);
            }
            Err(e) => {
                tracing::warn!("Failed to remove {}: {}", path, e);
                summary.file_errors += 1;
            }
        }
    }

    tracing::info!(
        "Purged domain {}: {} records, {} files removed",
        domain,
        summary.records_deleted,
        summary.files_removed
    );

    Ok(summary)
}

/// Count and total size of all recorded files.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn totals(pool: &Pool<Sqlite>) -> std::result::Result<Totals, sqlx::Error> {
    let (files, bytes): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(filesize), 0) FROM artifacts")
            .fetch_one(pool)
            .await?;

    Ok(Totals {
        total_files: u64::try_from(files).unwrap_or_default(),
        total_bytes: u64::try_from(bytes).unwrap_or_default(),
    })
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_artifact(row: &SqliteRow) -> Result<ArtifactRecord> {
    let scanned_at_raw: String = row.try_get("scanned_at")?;
    let scanned_at = DateTime::parse_from_rfc3339(&scanned_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DatabaseError::Decode(format!("invalid scanned_at '{scanned_at_raw}': {e}"))
        })?;

    let url: String = row.try_get("url")?;
    let metadata_json: String = row.try_get("metadata_json")?;
    let metadata = serde_json::from_str::<MetadataRecord>(&metadata_json).unwrap_or_else(|e| {
        tracing::warn!("Unreadable metadata for {}: {}", url, e);
        MetadataRecord::default()
    });

    let filesize: i64 = row.try_get("filesize")?;

    Ok(ArtifactRecord {
        id: row.try_get("id")?,
        domain: row.try_get("domain")?,
        url,
        local_path: row.try_get("local_path")?,
        filename: row.try_get("filename")?,
        extension: row.try_get("extension")?,
        filesize: u64::try_from(filesize).unwrap_or_default(),
        scanned_at,
        metadata,
    })
}

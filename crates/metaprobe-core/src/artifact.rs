//! Persisted artifact records.

use crate::metadata::MetadataRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloaded file's durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Auto-incrementing row id
    pub id: i64,
    /// Domain label of the scan that found the file
    pub domain: String,
    /// Source URL (unique across the store)
    pub url: String,
    /// Where the bytes were written on disk
    pub local_path: String,
    /// File name derived from the URL path
    pub filename: String,
    /// Lowercased extension with leading dot
    pub extension: String,
    /// Size in bytes
    pub filesize: u64,
    /// When the file was recorded
    pub scanned_at: DateTime<Utc>,
    /// Extracted metadata and findings
    pub metadata: MetadataRecord,
}

/// Parameters for recording a new artifact.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    /// Domain label
    pub domain: String,
    /// Source URL
    pub url: String,
    /// Local storage path
    pub local_path: String,
    /// File name
    pub filename: String,
    /// Extension with leading dot
    pub extension: String,
    /// Size in bytes
    pub filesize: u64,
    /// Extracted metadata and findings
    pub metadata: MetadataRecord,
}

//! Artifact pipeline: extract, detect, write to disk, record.
//!
//! Shared by every scan job and by direct uploads. The file is written
//! before the row is inserted; if the insert loses a dedup race or fails,
//! the freshly written file is removed again so no orphan remains.

use crate::error::{Result, ScanError};
use metaprobe_core::{ArtifactRecord, NewArtifact};
use metaprobe_db::{Database, InsertOutcome};
use metaprobe_discovery::SensitiveDetector;
use metaprobe_extract::ExtractorRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Domain label for files analyzed without crawling.
pub const UPLOAD_DOMAIN: &str = "uploads";

/// Result of handing one file to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// A new record was stored.
    Recorded(ArtifactRecord),
    /// Another worker recorded the same URL first.
    Duplicate,
}

/// Extraction, detection and persistence of downloaded files.
#[derive(Debug, Clone)]
pub struct ArtifactPipeline {
    db: Database,
    registry: Arc<ExtractorRegistry>,
    detector: Arc<SensitiveDetector>,
    downloads_dir: PathBuf,
}

impl ArtifactPipeline {
    /// Create a pipeline writing files below `downloads_dir`.
    #[must_use]
    pub fn new(
        db: Database,
        registry: ExtractorRegistry,
        detector: SensitiveDetector,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            detector: Arc::new(detector),
            downloads_dir: downloads_dir.into(),
        }
    }

    /// The store records are written to.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Root of the download tree.
    #[must_use]
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Record a file downloaded from `url` while scanning `domain`.
    pub async fn record_download(
        &self,
        domain: &str,
        url: &Url,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<RecordOutcome> {
        let filename = filename_from_url(url, extension);
        self.record(domain, url.as_str(), &filename, extension, bytes)
            .await
    }

    /// Analyze a file supplied directly, bypassing the crawler.
    ///
    /// The file is filed under the `uploads` domain with a synthetic
    /// `upload://<uuid>/<filename>` URL. Extensions outside every
    /// extractor's reach are still recorded, with empty metadata.
    pub async fn analyze_upload(&self, filename: &str, bytes: Vec<u8>) -> Result<ArtifactRecord> {
        let filename = sanitize_filename(filename, "upload");
        let extension = extension_of(&filename);
        let url = format!("upload://{}/{}", Uuid::new_v4(), filename);

        match self
            .record(UPLOAD_DOMAIN, &url, &filename, &extension, bytes)
            .await?
        {
            RecordOutcome::Recorded(record) => Ok(record),
            RecordOutcome::Duplicate => Err(ScanError::Storage(
                metaprobe_db::DatabaseError::SerializationError(format!(
                    "upload URL collision: {url}"
                )),
            )),
        }
    }

    async fn record(
        &self,
        domain: &str,
        url: &str,
        filename: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<RecordOutcome> {
        let registry = Arc::clone(&self.registry);
        let ext = extension.to_string();
        let (bytes, mut metadata) = tokio::task::spawn_blocking(move || {
            let metadata = registry.extract(&ext, &bytes);
            (bytes, metadata)
        })
        .await
        .map_err(|e| ScanError::Io(std::io::Error::other(format!("extraction task failed: {e}"))))?;

        if let Some(text) = &metadata.extracted_text {
            metadata.sensitive_findings = self.detector.detect(text);
        }
        if !metadata.sensitive_findings.is_empty() {
            tracing::warn!(
                "Possible sensitive content in {}: {:?}",
                url,
                metadata.sensitive_findings
            );
        }

        let dir = self.downloads_dir.join(sanitize_path_component(domain));
        tokio::fs::create_dir_all(&dir).await?;
        let local_path = dir.join(format!("{}-{}", Uuid::new_v4().simple(), filename));
        tokio::fs::write(&local_path, &bytes).await?;

        let artifact = NewArtifact {
            domain: domain.to_string(),
            url: url.to_string(),
            local_path: local_path.to_string_lossy().into_owned(),
            filename: filename.to_string(),
            extension: extension.to_string(),
            filesize: bytes.len() as u64,
            metadata,
        };

        match self.db.insert_artifact(artifact).await {
            Ok(InsertOutcome::Inserted(record)) => {
                tracing::info!("Recorded {} ({} bytes)", url, record.filesize);
                Ok(RecordOutcome::Recorded(record))
            }
            Ok(InsertOutcome::Duplicate) => {
                remove_quietly(&local_path).await;
                Ok(RecordOutcome::Duplicate)
            }
            Err(e) => {
                remove_quietly(&local_path).await;
                Err(e.into())
            }
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!("Could not remove {}: {}", path.display(), e);
    }
}

/// Last path segment of `url`, made safe for the filesystem.
fn filename_from_url(url: &Url, extension: &str) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    sanitize_filename(segment, &format!("download{extension}"))
}

fn sanitize_filename(name: &str, fallback: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = sanitize_path_component(base);
    if cleaned.trim_matches(['.', '_']).is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

fn sanitize_path_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metaprobe_core::FindingKind;
    use lopdf::dictionary;
    use tempfile::TempDir;

    async fn pipeline(tmp: &TempDir) -> ArtifactPipeline {
        let db = Database::open(tmp.path().join("store.db"))
            .await
            .expect("open database");
        ArtifactPipeline::new(
            db,
            ExtractorRegistry::with_defaults(),
            SensitiveDetector::default(),
            tmp.path().join("downloads"),
        )
    }

    #[test]
    fn test_filename_from_url() {
        let url = Url::parse("http://a.test/docs/Q3%20Report.pdf?x=1").expect("url");
        assert_eq!(filename_from_url(&url, ".pdf"), "Q3_20Report.pdf");

        let url = Url::parse("http://a.test/docs/").expect("url");
        assert_eq!(filename_from_url(&url, ".pdf"), "download.pdf");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd", "x"), "passwd");
        assert_eq!(sanitize_filename(r"C:\temp\a b.txt", "x"), "a_b.txt");
        assert_eq!(sanitize_filename("..", "fallback"), "fallback");
        assert_eq!(sanitize_path_component("host:8080"), "host_8080");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.DOCX"), ".docx");
        assert_eq!(extension_of("README"), "");
    }

    #[tokio::test]
    async fn test_record_download_writes_file_and_row() {
        let tmp = TempDir::new().expect("temp dir");
        let pipeline = pipeline(&tmp).await;
        let url = Url::parse("http://corp.test/notes/readme.txt").expect("url");

        let outcome = pipeline
            .record_download("corp.test", &url, ".txt", b"hello".to_vec())
            .await
            .expect("record download");
        let record = match outcome {
            RecordOutcome::Recorded(record) => record,
            RecordOutcome::Duplicate => panic!("first record must be stored"),
        };

        assert_eq!(record.filename, "readme.txt");
        assert_eq!(record.filesize, 5);
        assert!(record.metadata.is_empty());
        let path = PathBuf::from(&record.local_path);
        assert!(path.starts_with(tmp.path().join("downloads").join("corp.test")));
        assert_eq!(std::fs::read(&path).expect("read back"), b"hello");
    }

    #[tokio::test]
    async fn test_duplicate_removes_written_file() {
        let tmp = TempDir::new().expect("temp dir");
        let pipeline = pipeline(&tmp).await;
        let url = Url::parse("http://corp.test/a.txt").expect("url");

        pipeline
            .record_download("corp.test", &url, ".txt", b"one".to_vec())
            .await
            .expect("first");
        let second = pipeline
            .record_download("corp.test", &url, ".txt", b"two".to_vec())
            .await
            .expect("second");

        assert_eq!(second, RecordOutcome::Duplicate);
        let files = std::fs::read_dir(tmp.path().join("downloads").join("corp.test"))
            .expect("read dir")
            .count();
        assert_eq!(files, 1);
    }

    #[tokio::test]
    async fn test_analyze_upload_runs_extraction_and_detection() {
        let tmp = TempDir::new().expect("temp dir");
        let pipeline = pipeline(&tmp).await;

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<lopdf::Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(lopdf::dictionary! {
            "Author" => lopdf::Object::string_literal("admin@corp.test"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");

        let record = pipeline
            .analyze_upload("report.PDF", bytes)
            .await
            .expect("analyze upload");

        assert_eq!(record.domain, UPLOAD_DOMAIN);
        assert!(record.url.starts_with("upload://"));
        assert!(record.url.ends_with("/report.PDF"));
        assert_eq!(record.extension, ".pdf");
        assert_eq!(record.metadata.author.as_deref(), Some("admin@corp.test"));
        // author is metadata, not text: detection only sees extracted text
        assert!(record
            .metadata
            .sensitive_findings
            .iter()
            .all(|f| f.kind != FindingKind::Email));

        let listed = pipeline
            .database()
            .list_by_domain(UPLOAD_DOMAIN)
            .await
            .expect("list uploads");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_with_unknown_extension_is_recorded_empty() {
        let tmp = TempDir::new().expect("temp dir");
        let pipeline = pipeline(&tmp).await;

        let record = pipeline
            .analyze_upload("notes.bin", b"password=hunter2".to_vec())
            .await
            .expect("analyze upload");

        assert_eq!(record.extension, ".bin");
        assert!(record.metadata.is_empty());
    }
}

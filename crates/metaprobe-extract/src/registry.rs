//! Extension-to-extractor dispatch.

use crate::error::Result;
use crate::image::ImageExtractor;
use crate::ooxml::{OoxmlExtractor, OoxmlKind};
use crate::pdf::PdfExtractor;
use metaprobe_core::MetadataRecord;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability implemented by each format strategy.
///
/// Implementations should read whatever they can: a failing property group
/// is logged and skipped, and `Err` is reserved for input that cannot be
/// opened at all.
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Read metadata and text from an in-memory file.
    fn extract(&self, bytes: &[u8]) -> Result<MetadataRecord>;
}

/// Routes an extension tag (`.pdf`, `.docx`, ...) to its extractor.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// An empty registry: every extension yields an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in PDF, office and image strategies.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(".pdf", PdfExtractor::new());

        for (ext, kind) in [
            (".docx", OoxmlKind::Word),
            (".dotx", OoxmlKind::Word),
            (".xlsx", OoxmlKind::Spreadsheet),
            (".xlsm", OoxmlKind::Spreadsheet),
            (".pptx", OoxmlKind::Presentation),
            (".ppsx", OoxmlKind::Presentation),
        ] {
            registry.register(ext, OoxmlExtractor::new(kind));
        }

        let image = Arc::new(ImageExtractor::new());
        for ext in [".jpg", ".jpeg", ".tif", ".tiff", ".png", ".webp"] {
            registry.register_shared(ext, image.clone());
        }

        registry
    }

    /// Register (or replace) the extractor for an extension.
    pub fn register(&mut self, extension: &str, extractor: impl Extractor + 'static) {
        self.register_shared(extension, Arc::new(extractor));
    }

    /// Register an extractor instance shared between several extensions.
    pub fn register_shared(&mut self, extension: &str, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(normalize(extension), extractor);
    }

    /// Whether an extension has a registered strategy.
    #[must_use]
    pub fn supports(&self, extension: &str) -> bool {
        self.extractors.contains_key(&normalize(extension))
    }

    /// Extract metadata for a file with the given extension tag.
    ///
    /// Never fails and never panics: unknown extensions, unreadable input and
    /// panicking parsers all produce an empty record.
    #[must_use]
    pub fn extract(&self, extension: &str, bytes: &[u8]) -> MetadataRecord {
        let Some(extractor) = self.extractors.get(&normalize(extension)) else {
            return MetadataRecord::default();
        };

        match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(bytes))) {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                debug!("{} extractor could not read file: {}", extractor.name(), e);
                MetadataRecord::default()
            }
            Err(_) => {
                warn!("{} extractor panicked; recording empty metadata", extractor.name());
                MetadataRecord::default()
            }
        }
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut extensions: Vec<&String> = self.extractors.keys().collect();
        extensions.sort();
        f.debug_struct("ExtractorRegistry")
            .field("extensions", &extensions)
            .finish()
    }
}

fn normalize(extension: &str) -> String {
    let ext = extension.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Collapse whitespace-only text to `None`.
pub(crate) fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    struct Panicking;

    impl Extractor for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<MetadataRecord> {
            panic!("parser bug");
        }
    }

    struct Failing;

    impl Extractor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<MetadataRecord> {
            Err(ExtractError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated",
            )))
        }
    }

    struct Fixed;

    impl Extractor for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _bytes: &[u8]) -> Result<MetadataRecord> {
            Ok(MetadataRecord {
                title: Some("fixed".to_string()),
                ..MetadataRecord::default()
            })
        }
    }

    #[test]
    fn test_unknown_extension_is_empty() {
        let registry = ExtractorRegistry::with_defaults();
        assert!(registry.extract(".zip", b"PK\x03\x04").is_empty());
        assert!(registry.extract(".txt", b"a@b.com").is_empty());
    }

    #[test]
    fn test_register_new_format() {
        let mut registry = ExtractorRegistry::new();
        assert!(!registry.supports("odt"));
        registry.register("ODT", Fixed);
        assert!(registry.supports(".odt"));
        assert_eq!(
            registry.extract(".odt", b"").title.as_deref(),
            Some("fixed")
        );
    }

    #[test]
    fn test_failures_become_empty_records() {
        let mut registry = ExtractorRegistry::new();
        registry.register(".bad", Failing);
        registry.register(".boom", Panicking);

        assert!(registry.extract(".bad", b"x").is_empty());
        assert!(registry.extract(".boom", b"x").is_empty());
    }

    #[test]
    fn test_garbage_never_escapes() {
        let registry = ExtractorRegistry::with_defaults();
        let garbage: Vec<&[u8]> = vec![
            b"",
            b"\x00\x01\x02\x03",
            b"%PDF-1.7\n%%EOF",
            b"PK\x03\x04garbage",
            b"\xFF\xD8\xFF\xE1\x00\x10Exif\x00\x00II*\x00",
            b"II*\x00\x08\x00\x00\x00\xFF\xFF",
        ];

        for ext in [".pdf", ".docx", ".xlsx", ".pptx", ".jpg", ".tiff", ".png", ".webp"] {
            for bytes in &garbage {
                let record = registry.extract(ext, bytes);
                assert!(record.sensitive_findings.is_empty());
            }
        }
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(" \n\t".to_string()), None);
        assert_eq!(non_blank("a".to_string()).as_deref(), Some("a"));
    }
}

//! Extension allow-list classification of discovered links.

use url::Url;

/// Extensions downloaded by default: documents, images, archives and
/// code/config files.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // Documents
    ".pdf", ".doc", ".docx", ".dot", ".dotx", ".ppt", ".pptx", ".pps", ".ppsx", ".xls", ".xlsx",
    ".xlsm", ".csv", ".ods", ".odt", ".odp", ".rtf", ".txt", ".xml", ".json", ".yaml", ".yml",
    ".html", ".htm",
    // Images
    ".jpg", ".jpeg", ".png", ".tiff", ".tif", ".bmp", ".gif", ".svg", ".webp",
    // Archives (download only)
    ".zip", ".rar", ".7z", ".tar", ".gz", ".tgz", ".bz2",
    // Code / config
    ".conf", ".ini", ".log", ".py", ".js", ".php", ".sh", ".bat", ".ps1",
];

/// Maps a URL to a recognized file extension from a configured allow-list.
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: Vec<String>,
}

impl Classifier {
    /// Build a classifier from an allow-list.
    ///
    /// Entries are lowercased and given a leading dot if they lack one;
    /// blank entries are dropped.
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    /// Classify a URL by the suffix of its lowercased path.
    ///
    /// Query strings and fragments are not part of the path, so
    /// `report.pdf?download=1` still classifies as `.pdf`.
    #[must_use]
    pub fn classify(&self, url: &Url) -> Option<String> {
        self.classify_name(url.path())
    }

    /// Classify a bare file name or path by suffix.
    ///
    /// Any allow-listed suffix is a match; when several match
    /// (`.gz` and `.tar.gz` both listed) the longest one is returned.
    #[must_use]
    pub fn classify_name(&self, name: &str) -> Option<String> {
        let lowered = name.to_lowercase();
        self.extensions
            .iter()
            .filter(|ext| lowered.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .cloned()
    }

    /// The normalized allow-list.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

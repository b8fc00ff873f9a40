//! Metaprobe Core - Foundation crate for the metaprobe document scanner.
//!
//! This crate provides shared types, error handling, configuration management
//! and URL classification that all other metaprobe crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Scan targets, job handles and domain-list parsing
//! - [`metadata`] - Extracted document metadata and sensitive findings
//! - [`artifact`] - Persisted artifact records
//! - [`classifier`] - Extension allow-list matching for discovered links
//!
//! # Example
//!
//! ```rust
//! use metaprobe_core::{AppConfig, Classifier, ScanTarget};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let classifier = Classifier::new(&config.classifier.allowed_extensions);
//!
//! let target = ScanTarget::parse("example.com", &config.crawler.default_scheme)?;
//! let link = target.url().join("/docs/report.pdf")?;
//! assert_eq!(classifier.classify(&link).as_deref(), Some(".pdf"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod metadata;
pub mod types;

// Re-export commonly used types
pub use artifact::{ArtifactRecord, NewArtifact};
pub use classifier::{Classifier, DEFAULT_EXTENSIONS};
pub use config::{AppConfig, ClassifierConfig, CrawlerConfig, DetectionConfig, StorageConfig};
pub use error::{ConfigError, ConfigResult, MetaprobeError, Result};
pub use metadata::{
    DocumentDetails, FindingKind, FormatDetails, ImageDetails, MetadataRecord, PdfDetails,
    SensitiveFinding,
};
pub use types::{parse_domain_list, JobId, ScanTarget};

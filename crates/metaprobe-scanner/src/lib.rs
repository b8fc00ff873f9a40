//! Metaprobe Scanner - crawl, download and record orchestration.
//!
//! Ties the leaf crates together: a [`Fetcher`] for HTTP, a per-job
//! [`Crawler`] confined to one origin, the [`ArtifactPipeline`] that runs
//! extraction and detection before persisting, and the [`ScanController`]
//! that owns job lifecycles.
//!
//! # Features
//!
//! - One background task per scan job, each with its own cancellation token
//! - Depth-first traversal bounded by `max_depth`, never leaving the origin
//! - Dedup against the store before every file download
//! - Per-link failures are logged and skipped; they never abort a job
//!
//! # Example
//!
//! ```rust,ignore
//! use metaprobe_core::AppConfig;
//! use metaprobe_db::Database;
//! use metaprobe_scanner::ScanController;
//!
//! let config = AppConfig::load_with_env()?;
//! let db = Database::open(config.database_path()?).await?;
//! let controller = ScanController::new(&config, db)?;
//!
//! let job = controller.start("example.com", config.crawler.max_depth)?;
//! let status = controller.wait(&job).await?;
//! println!("{} artifacts recorded", status.artifacts_recorded);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod controller;
pub mod crawler;
#[allow(missing_docs)]
pub mod error;
pub mod fetcher;
pub mod pipeline;

// Re-export commonly used types
pub use controller::{JobState, JobStatus, ScanController};
pub use crawler::{CrawlCounters, Crawler};
pub use error::{Result, ScanError};
pub use fetcher::{FetchedFile, FetchedPage, Fetcher};
pub use pipeline::{ArtifactPipeline, RecordOutcome, UPLOAD_DOMAIN};

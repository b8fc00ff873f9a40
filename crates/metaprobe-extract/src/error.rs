//! Extraction error types.
//!
//! These never leave the crate's public `extract` entry point: the
//! registry logs them and falls back to a partial or empty record.

use thiserror::Error;

/// Reasons a format strategy could not read a file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// PDF structure could not be parsed.
    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Office package is not a readable zip container.
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML.
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Image has no readable tag directory.
    #[error("exif: {0}")]
    Exif(#[from] exif::Error),

    /// Reading a package part failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for extraction steps.
pub type Result<T> = std::result::Result<T, ExtractError>;

//! Metaprobe Extraction
//!
//! Format-dispatched metadata and text extraction for downloaded files.
//!
//! | Strategy | Extensions | Reads |
//! |---|---|---|
//! | [`PdfExtractor`] | `.pdf` | document-info dictionary, per-page text |
//! | [`OoxmlExtractor`] | `.docx`, `.dotx`, `.xlsx`, `.xlsm`, `.pptx`, `.ppsx` | core/app properties, paragraph text |
//! | [`ImageExtractor`] | `.jpg`, `.jpeg`, `.tif`, `.tiff`, `.png`, `.webp` | EXIF tags, GPS position |
//!
//! Every other extension yields an empty [`MetadataRecord`](metaprobe_core::MetadataRecord).
//!
//! ```ignore
//! use metaprobe_extract::ExtractorRegistry;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! let record = registry.extract(".pdf", &bytes);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod image;
pub mod ooxml;
pub mod pdf;
pub mod registry;

pub use error::ExtractError;
pub use image::ImageExtractor;
pub use ooxml::{OoxmlExtractor, OoxmlKind};
pub use pdf::PdfExtractor;
pub use registry::{Extractor, ExtractorRegistry};

//! Metaprobe Discovery Module
//!
//! Sensitive-marker detection over text extracted from downloaded documents.

pub mod sensitive;

// Re-export main types
pub use sensitive::SensitiveDetector;

//! Extracted document metadata and sensitive findings.
//!
//! A [`MetadataRecord`] carries the fields every format may populate
//! (author, title, dates, tool, text) plus a [`FormatDetails`] variant for
//! the fields specific to one format family. Absent fields are omitted from
//! the serialized form rather than written as empty strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata extracted from one downloaded file.
///
/// Serializes to the `metadata_json` column with `PascalCase` keys
/// (`Author`, `CreateDate`, `ExtractedText`, `SensitiveFindings`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataRecord {
    /// Document author / creator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Document title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Creation timestamp as found in the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
    /// Last modification timestamp as found in the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_date: Option<String>,
    /// Tool that produced the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_tool: Option<String>,
    /// Free-form comments / description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Template the document was based on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Original source path recorded inside the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Plain text extracted from the document body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    /// Format-family specific fields
    #[serde(default, skip_serializing_if = "FormatDetails::is_unknown")]
    pub format: FormatDetails,
    /// Sensitive markers detected in the extracted text
    #[serde(default)]
    pub sensitive_findings: Vec<SensitiveFinding>,
}

impl MetadataRecord {
    /// True when any metadata field, text or format detail was extracted.
    ///
    /// Findings are not considered: they are derived from the text.
    #[must_use]
    pub fn has_fields(&self) -> bool {
        self.author.is_some()
            || self.title.is_some()
            || self.create_date.is_some()
            || self.modify_date.is_some()
            || self.creator_tool.is_some()
            || self.comments.is_some()
            || self.template.is_some()
            || self.source_file.is_some()
            || self.extracted_text.is_some()
            || !self.format.is_unknown()
    }

    /// True when nothing at all is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_fields() && self.sensitive_findings.is_empty()
    }
}

/// Fields specific to one format family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Kind")]
pub enum FormatDetails {
    /// No format-specific data (unrecognized extension or nothing readable)
    #[default]
    Unknown,
    /// PDF document-info dictionary
    Pdf(PdfDetails),
    /// Office Open XML package properties
    Document(DocumentDetails),
    /// Embedded image tag directory
    Image(ImageDetails),
}

impl FormatDetails {
    /// Whether this is the `Unknown` variant.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// PDF-specific metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PdfDetails {
    /// `/Producer` entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// `/Subject` entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// `/Keywords` entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Number of pages in the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// Office Open XML core/app properties beyond the common fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentDetails {
    /// `cp:lastModifiedBy`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    /// `cp:revision`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// `cp:keywords`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// `dc:subject`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// `Company` from the extended properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Image tag directory with GPS position surfaced as first-class fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDetails {
    /// Human-readable tag name -> displayed value
    #[serde(rename = "Tags", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Decimal latitude, negative south of the equator
    #[serde(rename = "GPSLatitude", skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,
    /// Decimal longitude, negative west of Greenwich
    #[serde(rename = "GPSLongitude", skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,
}

/// Category of a sensitive marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    /// Email address
    Email,
    /// Windows-style absolute path
    Path,
    /// Configured sensitive keyword
    Keyword,
}

impl FindingKind {
    /// Lowercase label used in the persisted form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Path => "path",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected category with its deduplicated matched values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveFinding {
    /// Finding category
    #[serde(rename = "type")]
    pub kind: FindingKind,
    /// Unique matched values
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_serializes_minimal() {
        let record = MetadataRecord::default();
        assert!(record.is_empty());
        let json = serde_json::to_string(&record).expect("serialize record");
        assert_eq!(json, r#"{"SensitiveFindings":[]}"#);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = MetadataRecord {
            author: Some("alice".to_string()),
            ..MetadataRecord::default()
        };
        let value = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(value["Author"], "alice");
        assert!(value.get("Title").is_none());
        assert!(value.get("Format").is_none());
    }

    #[test]
    fn test_finding_wire_format() {
        let finding = SensitiveFinding {
            kind: FindingKind::Email,
            values: vec!["a@b.com".to_string()],
        };
        let json = serde_json::to_string(&finding).expect("serialize finding");
        assert_eq!(json, r#"{"type":"email","values":["a@b.com"]}"#);
    }

    #[test]
    fn test_image_details_parse_from_stored_json() {
        let json = r#"{
            "Author": "cam",
            "Format": {"Kind": "Image", "Tags": {"Make": "ACME"}, "GPSLatitude": 40.5, "GPSLongitude": -3.25},
            "SensitiveFindings": [{"type": "path", "values": ["C:\\Users\\"]}]
        }"#;
        let record: MetadataRecord = serde_json::from_str(json).expect("parse record");

        assert_eq!(record.author.as_deref(), Some("cam"));
        match &record.format {
            FormatDetails::Image(image) => {
                assert_eq!(image.tags.get("Make").map(String::as_str), Some("ACME"));
                assert_eq!(image.gps_latitude, Some(40.5));
                assert_eq!(image.gps_longitude, Some(-3.25));
            }
            other => panic!("expected image details, got {other:?}"),
        }
        assert_eq!(record.sensitive_findings[0].kind, FindingKind::Path);
    }

    #[test]
    fn test_has_fields() {
        let mut record = MetadataRecord::default();
        assert!(!record.has_fields());

        record.format = FormatDetails::Pdf(PdfDetails {
            page_count: Some(1),
            ..PdfDetails::default()
        });
        assert!(record.has_fields());
    }
}

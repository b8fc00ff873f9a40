//! PDF strategy: document-info dictionary plus per-page text.
//!
//! `lopdf` is the primary reader. `pdf-extract` is consulted for the text
//! only when `lopdf` produced none, so its output never overwrites fields
//! the primary reader already set.

use crate::error::Result;
use crate::registry::{non_blank, Extractor};
use lopdf::{Dictionary, Document, Object};
use metaprobe_core::{FormatDetails, MetadataRecord, PdfDetails};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Reads PDF metadata and text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create the PDF strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<MetadataRecord> {
        let mut record = MetadataRecord::default();

        match Document::load_mem(bytes) {
            Ok(doc) => {
                let mut details = PdfDetails::default();
                match info_dictionary(&doc) {
                    Some(info) => apply_info(&doc, info, &mut record, &mut details),
                    None => debug!("PDF has no document-info dictionary"),
                }

                let pages = doc.get_pages();
                details.page_count = u32::try_from(pages.len()).ok();
                record.extracted_text = page_text(&doc, pages.keys().copied());
                record.format = FormatDetails::Pdf(details);
            }
            Err(e) => debug!("lopdf could not load document: {}", e),
        }

        if record.extracted_text.is_none() {
            record.extracted_text = fallback_text(bytes);
        }

        Ok(record)
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    match info {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        other => other.as_dict().ok(),
    }
}

fn apply_info(
    doc: &Document,
    info: &Dictionary,
    record: &mut MetadataRecord,
    details: &mut PdfDetails,
) {
    record.author = info_field(doc, info, b"Author");
    record.title = info_field(doc, info, b"Title");
    record.creator_tool = info_field(doc, info, b"Creator");
    record.create_date = info_field(doc, info, b"CreationDate");
    record.modify_date = info_field(doc, info, b"ModDate");
    details.producer = info_field(doc, info, b"Producer");
    details.subject = info_field(doc, info, b"Subject");
    details.keywords = info_field(doc, info, b"Keywords");
}

fn info_field(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    info.get(key).ok().and_then(|obj| text_value(doc, obj))
}

fn text_value(doc: &Document, obj: &Object) -> Option<String> {
    let value = match obj {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::Reference(id) => return text_value(doc, doc.get_object(*id).ok()?),
        _ => return None,
    };
    let trimmed = value.trim_matches(char::from(0)).trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decode a PDF text string: UTF-16BE with byte-order mark, otherwise
/// treated as Latin-1 (close enough to PDFDocEncoding for metadata).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn page_text(doc: &Document, pages: impl Iterator<Item = u32>) -> Option<String> {
    let mut text = String::new();
    for page in pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!("No text on page {}: {}", page, e),
        }
    }
    non_blank(text)
}

fn fallback_text(bytes: &[u8]) -> Option<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => non_blank(text),
        Ok(Err(e)) => {
            debug!("pdf-extract fallback failed: {}", e);
            None
        }
        Err(_) => {
            debug!("pdf-extract fallback panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    fn sample_pdf(with_info: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal("contact a@b.com")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if with_info {
            let info_id = doc.add_object(dictionary! {
                "Author" => Object::string_literal("Jane Roe"),
                "Title" => Object::String(
                    vec![0xFE, 0xFF, 0x00, 0x51, 0x00, 0x33],
                    lopdf::StringFormat::Hexadecimal,
                ),
                "Producer" => Object::string_literal("TestWriter 1.0"),
                "CreationDate" => Object::string_literal("D:20240102030405Z"),
                "Keywords" => Object::string_literal(""),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save pdf");
        buf
    }

    #[test]
    fn test_reads_info_dictionary() {
        let record = PdfExtractor::new()
            .extract(&sample_pdf(true))
            .expect("extract pdf");

        assert_eq!(record.author.as_deref(), Some("Jane Roe"));
        assert_eq!(record.title.as_deref(), Some("Q3"));
        assert_eq!(record.create_date.as_deref(), Some("D:20240102030405Z"));
        match record.format {
            FormatDetails::Pdf(details) => {
                assert_eq!(details.producer.as_deref(), Some("TestWriter 1.0"));
                assert_eq!(details.keywords, None);
                assert_eq!(details.page_count, Some(1));
            }
            other => panic!("expected pdf details, got {other:?}"),
        }
    }

    #[test]
    fn test_reads_page_text() {
        let record = PdfExtractor::new()
            .extract(&sample_pdf(false))
            .expect("extract pdf");

        assert_eq!(record.author, None);
        let text = record.extracted_text.expect("page text");
        assert!(text.contains("a@b.com"), "unexpected text: {text:?}");
    }

    #[test]
    fn test_garbage_yields_empty_record() {
        let record = PdfExtractor::new()
            .extract(b"not a pdf at all")
            .expect("extract never fails on garbage");
        assert!(record.is_empty());
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"plain"), "plain");
        assert_eq!(decode_text_string(&[0x45, 0x73, 0xE9]), "Esé");
        assert_eq!(
            decode_text_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]),
            "Hi"
        );
    }
}

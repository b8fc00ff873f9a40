//! Office Open XML strategy (`.docx`, `.xlsx`, `.pptx` and their siblings).
//!
//! Core properties come from `docProps/core.xml`, tool and template from
//! `docProps/app.xml`. Body text is the package's paragraphs in document
//! order joined by newlines. Each part is read independently, so a missing
//! or malformed part only loses that part's fields.

use crate::error::Result;
use crate::registry::{non_blank, Extractor};
use metaprobe_core::{DocumentDetails, FormatDetails, MetadataRecord};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const CORE_PROPERTIES: &str = "docProps/core.xml";
const APP_PROPERTIES: &str = "docProps/app.xml";

/// Which family of package, deciding where body text lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OoxmlKind {
    /// Word processing: `word/document.xml`
    Word,
    /// Spreadsheet: `xl/sharedStrings.xml`
    Spreadsheet,
    /// Presentation: `ppt/slides/slideN.xml`, in slide order
    Presentation,
}

/// Reads OOXML package properties and text.
#[derive(Debug, Clone, Copy)]
pub struct OoxmlExtractor {
    kind: OoxmlKind,
}

impl OoxmlExtractor {
    /// Create a strategy for one package family.
    #[must_use]
    pub fn new(kind: OoxmlKind) -> Self {
        Self { kind }
    }
}

impl Extractor for OoxmlExtractor {
    fn name(&self) -> &'static str {
        match self.kind {
            OoxmlKind::Word => "word",
            OoxmlKind::Spreadsheet => "spreadsheet",
            OoxmlKind::Presentation => "presentation",
        }
    }

    fn extract(&self, bytes: &[u8]) -> Result<MetadataRecord> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut record = MetadataRecord::default();
        let mut details = DocumentDetails::default();

        match read_part(&mut archive, CORE_PROPERTIES).and_then(|xml| leaf_elements(&xml)) {
            Ok(fields) => {
                for (name, value) in fields {
                    apply_core_property(&name, value, &mut record, &mut details);
                }
            }
            Err(e) => debug!("No core properties: {}", e),
        }

        match read_part(&mut archive, APP_PROPERTIES).and_then(|xml| leaf_elements(&xml)) {
            Ok(fields) => {
                for (name, value) in fields {
                    match name.as_str() {
                        "Application" => record.creator_tool = Some(value),
                        "Template" => record.template = Some(value),
                        "Company" => details.company = Some(value),
                        _ => {}
                    }
                }
            }
            Err(e) => debug!("No extended properties: {}", e),
        }

        match self.body_text(&mut archive) {
            Ok(text) => record.extracted_text = non_blank(text),
            Err(e) => debug!("No body text: {}", e),
        }

        if details != DocumentDetails::default() {
            record.format = FormatDetails::Document(details);
        }

        Ok(record)
    }
}

impl OoxmlExtractor {
    fn body_text(&self, archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<String> {
        match self.kind {
            OoxmlKind::Word => {
                let xml = read_part(archive, "word/document.xml")?;
                Ok(paragraphs(&xml, b"p")?.join("\n"))
            }
            OoxmlKind::Spreadsheet => {
                let xml = read_part(archive, "xl/sharedStrings.xml")?;
                Ok(paragraphs(&xml, b"si")?.join("\n"))
            }
            OoxmlKind::Presentation => {
                let mut slides: Vec<(u32, String)> = archive
                    .file_names()
                    .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
                    .collect();
                slides.sort();

                let mut lines = Vec::new();
                for (_, name) in slides {
                    let xml = read_part(archive, &name)?;
                    lines.extend(paragraphs(&xml, b"p")?);
                }
                Ok(lines.join("\n"))
            }
        }
    }
}

fn apply_core_property(
    name: &str,
    value: String,
    record: &mut MetadataRecord,
    details: &mut DocumentDetails,
) {
    match name {
        "creator" => record.author = Some(value),
        "title" => record.title = Some(value),
        "created" => record.create_date = Some(value),
        "modified" => record.modify_date = Some(value),
        "description" => record.comments = Some(value),
        "lastModifiedBy" => details.last_modified_by = Some(value),
        "revision" => details.revision = Some(value),
        "keywords" => details.keywords = Some(value),
        "subject" => details.subject = Some(value),
        _ => {}
    }
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// `(local name, text)` for every element that directly holds non-blank text.
fn leaf_elements(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut current: Option<String> = None;
    let mut fields = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                if let Some(name) = &current {
                    let value = t.unescape()?;
                    let value = value.trim();
                    if !value.is_empty() {
                        fields.push((name.clone(), value.to_string()));
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

/// Text of every `paragraph` element, built from its `t` runs.
///
/// Paragraphs nested inside another (text boxes) are emitted on their own,
/// before the enclosing paragraph.
fn paragraphs(xml: &str, paragraph: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut out = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                if name.as_ref() == paragraph {
                    open.push(String::new());
                } else if name.as_ref() == b"t" {
                    in_run = true;
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == paragraph {
                    out.push(String::new());
                } else if e.local_name().as_ref() == b"tab" {
                    if let Some(buf) = open.last_mut() {
                        buf.push('\t');
                    }
                }
            }
            Event::Text(t) if in_run => {
                if let Some(buf) = open.last_mut() {
                    buf.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if name.as_ref() == paragraph {
                    if let Some(text) = open.pop() {
                        out.push(text);
                    }
                } else if name.as_ref() == b"t" {
                    in_run = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

//! Image strategy: embedded EXIF tag directory.

use crate::error::Result;
use crate::registry::Extractor;
use exif::{Exif, Field, In, Reader, Tag, Value};
use metaprobe_core::{FormatDetails, ImageDetails, MetadataRecord};
use std::io::Cursor;

/// Values longer than this are dropped from the tag map (maker notes,
/// embedded previews).
const MAX_TAG_VALUE_LEN: usize = 256;

/// Reads EXIF tags from JPEG, TIFF, PNG and WebP containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageExtractor;

impl ImageExtractor {
    /// Create the image strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for ImageExtractor {
    fn name(&self) -> &'static str {
        "image"
    }

    fn extract(&self, bytes: &[u8]) -> Result<MetadataRecord> {
        let exif = Reader::new().read_from_container(&mut Cursor::new(bytes))?;

        let mut details = ImageDetails::default();
        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            if field.tag == Tag::MakerNote {
                continue;
            }
            let value = display_text(field, &exif);
            if value.is_empty() || value.len() > MAX_TAG_VALUE_LEN {
                continue;
            }
            details.tags.insert(field.tag.to_string(), value);
        }

        details.gps_latitude = gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S');
        details.gps_longitude =
            gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W');

        let mut record = MetadataRecord {
            author: ascii_field(&exif, Tag::Artist),
            title: ascii_field(&exif, Tag::ImageDescription),
            create_date: ascii_field(&exif, Tag::DateTimeOriginal),
            modify_date: ascii_field(&exif, Tag::DateTime),
            creator_tool: ascii_field(&exif, Tag::Software),
            ..MetadataRecord::default()
        };
        if details != ImageDetails::default() {
            record.format = FormatDetails::Image(details);
        }

        Ok(record)
    }
}

fn display_text(field: &Field, exif: &Exif) -> String {
    match &field.value {
        Value::Ascii(_) => ascii_text(&field.value).unwrap_or_default(),
        _ => field.display_value().with_unit(exif).to_string(),
    }
}

fn ascii_text(value: &Value) -> Option<String> {
    let Value::Ascii(parts) = value else {
        return None;
    };
    let text = parts
        .iter()
        .map(|part| String::from_utf8_lossy(part).trim_end_matches('\0').trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|field| ascii_text(&field.value))
}

/// Degrees/minutes/seconds rationals to signed decimal degrees.
fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };

    let mut decimal = 0.0;
    for (part, scale) in parts.iter().zip([1.0, 60.0, 3600.0]) {
        if part.denom == 0 {
            return None;
        }
        decimal += part.to_f64() / scale;
    }
    if !decimal.is_finite() {
        return None;
    }

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(parts) => parts.first().and_then(|p| p.first()).copied(),
            _ => None,
        })
        .is_some_and(|r| r.eq_ignore_ascii_case(&negative_ref));

    Some(if negative { -decimal } else { decimal })
}

//! Capture timestamp and dimension extraction
//!
//! EXIF wins when it has the field; otherwise the file's modification time
//! and the decoded image header are used. Modification time only changes when
//! the file content changes, unlike creation or access time.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use tracing::debug;

use super::timestamp::{parse_exif_timestamp, truncate_to_seconds};
use super::{PhotoRecord, TimestampSource};
use crate::error::{Result, TimelapseError};

/// Fields read from a photo's EXIF block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExifFields {
    pub captured_at: Option<NaiveDateTime>,
    /// Horizontal pixel count (`ImageWidth` / `PixelXDimension`)
    pub width: Option<u32>,
    /// Vertical pixel count (`ImageLength` / `PixelYDimension`)
    pub height: Option<u32>,
}

/// Build the record for one photo.
///
/// The image header is always decoded, so a file that is not a readable image
/// fails here rather than halfway through compositing.
pub fn extract(path: &Path) -> Result<PhotoRecord> {
    let decoded = image::image_dimensions(path).map_err(|source| TimelapseError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let exif = read_exif(path);
    let record = resolve(path, exif, decoded, || modified_time(path))?;

    debug!(
        "{}: {} ({}) {}x{}",
        record.file_name(),
        record.captured_at,
        record.source,
        record.width,
        record.height
    );
    Ok(record)
}

/// Combine EXIF fields with the fallbacks
fn resolve(
    path: &Path,
    exif: Option<ExifFields>,
    decoded: (u32, u32),
    modified: impl FnOnce() -> Result<NaiveDateTime>,
) -> Result<PhotoRecord> {
    let exif = exif.unwrap_or_default();

    let (captured_at, source) = match exif.captured_at {
        Some(ts) => (ts, TimestampSource::Exif),
        None => (modified()?, TimestampSource::Modified),
    };

    let (width, height) = match (exif.width, exif.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => decoded,
    };

    Ok(PhotoRecord {
        path: path.to_path_buf(),
        captured_at,
        width,
        height,
        source,
    })
}

/// Read the EXIF block, if the container has one
pub fn read_exif(path: &Path) -> Option<ExifFields> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let text = |tag: Tag| -> Option<NaiveDateTime> {
        let field = exif.get_field(tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(parts) => parts
                .first()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .and_then(parse_exif_timestamp),
            _ => None,
        }
    };
    let number = |tag: Tag| -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
    };

    Some(ExifFields {
        captured_at: text(Tag::DateTime).or_else(|| text(Tag::DateTimeOriginal)),
        width: number(Tag::ImageWidth).or_else(|| number(Tag::PixelXDimension)),
        height: number(Tag::ImageLength).or_else(|| number(Tag::PixelYDimension)),
    })
}

/// Last content modification time in local time, whole seconds
pub fn modified_time(path: &Path) -> Result<NaiveDateTime> {
    let modified = std::fs::metadata(path)?.modified()?;
    let local: DateTime<Local> = modified.into();
    Ok(truncate_to_seconds(local.naive_local()))
}

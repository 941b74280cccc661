//! Photo discovery and per-photo metadata
//!
//! - **discover** - flat scan of the photos directory with an extension allow-list
//! - **metadata** - capture timestamp and dimensions from EXIF or the filesystem
//! - **timestamp** - the textual timestamp formats used throughout

pub mod metadata;
pub mod timestamp;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::Result;

pub use metadata::extract;
pub use timestamp::{
    format_timestamp, parse_exif_timestamp, parse_timestamp, TimestampParseError,
    TIMESTAMP_FORMAT,
};

/// Accepted photo extensions (case-insensitive)
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Accepted audio extensions (case-insensitive)
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3"];

/// Where a record's `captured_at` came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimestampSource {
    /// EXIF `DateTime` tag
    Exif,
    /// File modification time
    Modified,
    /// Entry in the correction file
    Corrected,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Exif => "exif",
            Self::Modified => "mtime",
            Self::Corrected => "corrected",
        })
    }
}

/// One accepted input photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoRecord {
    pub path: PathBuf,
    pub captured_at: NaiveDateTime,
    pub width: u32,
    pub height: u32,
    pub source: TimestampSource,
}

impl PhotoRecord {
    /// File name, the key used by the correction file
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// True when `path` ends in one of `extensions`, ignoring case
#[must_use]
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// List regular files in `dir` with an allowed extension, sorted by file name.
///
/// The sort fixes the input order that breaks timestamp ties later on.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Extract a record for every accepted photo in `dir`
pub fn discover_photos(dir: &Path) -> Result<Vec<PhotoRecord>> {
    list_files(dir, PHOTO_EXTENSIONS)?
        .iter()
        .map(|path| extract(path))
        .collect()
}

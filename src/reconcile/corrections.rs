//! Persisted timestamp corrections (`corrections.json`).
//!
//! The file is a flat JSON object mapping a photo's file name to its
//! authoritative capture time:
//!
//! ```json
//! {
//!   "IMG_0042.jpg": "2024-03-01 08:15:00"
//! }
//! ```
//!
//! It is always rewritten whole through a temp file and a rename, so a crash
//! mid-write leaves the previous version intact.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Result, TimelapseError};
use crate::photo::{format_timestamp, parse_timestamp};

/// File name to authoritative capture time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionMap {
    entries: BTreeMap<String, NaiveDateTime>,
}

impl CorrectionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from disk; a missing file is an empty map
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No correction file at {}", path.display());
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, path)
    }

    /// Parse the JSON form; `origin` is only used in error messages
    pub fn from_json(content: &str, origin: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        let invalid = |message: String| TimelapseError::Corrections {
            path: origin.to_path_buf(),
            message,
        };

        let raw: BTreeMap<String, String> =
            serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;

        let entries = raw
            .into_iter()
            .map(|(name, value)| {
                parse_timestamp(&value)
                    .map(|ts| (name.clone(), ts))
                    .map_err(|e| invalid(format!("entry {name:?}: {e}")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { entries })
    }

    /// Serialize with keys sorted
    pub fn to_json(&self) -> Result<String> {
        let raw: BTreeMap<&str, String> = self
            .entries
            .iter()
            .map(|(name, ts)| (name.as_str(), format_timestamp(ts)))
            .collect();
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// Replace the file content with the full map
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = temp_path(path);
        let json = self.to_json()?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;

        debug!("Saved {} corrections to {}", self.len(), path.display());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&NaiveDateTime> {
        self.entries.get(file_name)
    }

    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.entries.contains_key(file_name)
    }

    pub fn insert(&mut self, file_name: impl Into<String>, ts: NaiveDateTime) {
        self.entries.insert(file_name.into(), ts);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NaiveDateTime)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let map = CorrectionMap::load(&dir.path().join("corrections.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrections.json");

        let mut map = CorrectionMap::new();
        map.insert("b.jpg", ts(9));
        map.insert("a.jpg", ts(8));
        map.save(&path).unwrap();

        let loaded = CorrectionMap::load(&path).unwrap();
        assert_eq!(loaded, map);
        assert!(!dir.path().join("corrections.json.tmp").exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.find("a.jpg").unwrap() < text.find("b.jpg").unwrap());
        assert!(text.contains("\"2024-01-01 08:00:00\""));
    }

    #[test]
    fn save_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrections.json");

        let mut map = CorrectionMap::new();
        map.insert("a.jpg", ts(1));
        map.save(&path).unwrap();
        map.insert("b.jpg", ts(2));
        map.save(&path).unwrap();

        let loaded = CorrectionMap::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("a.jpg").count(), 1);
    }

    #[test]
    fn rejects_partial_timestamp() {
        let err = CorrectionMap::from_json(r#"{"a.jpg": "2024-01-01"}"#, Path::new("c.json"))
            .unwrap_err();
        assert!(matches!(err, TimelapseError::Corrections { .. }));
        assert!(err.to_string().contains("a.jpg"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(CorrectionMap::from_json("[1, 2]", Path::new("c.json")).is_err());
    }

    #[test]
    fn blank_file_is_empty() {
        assert!(CorrectionMap::from_json("  \n", Path::new("c.json"))
            .unwrap()
            .is_empty());
    }
}

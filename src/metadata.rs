// src/metadata.rs

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// File-system facts about an extracted file. Always present on success.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileInfo {
    #[serde(rename = "File Name")]
    pub file_name: String,
    #[serde(rename = "File Path")]
    pub file_path: String,
    #[serde(rename = "File Size")]
    pub file_size: u64,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "MIME Type")]
    pub mime_type: String,
    #[serde(rename = "Created", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(rename = "Modified", default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FileInfo {
    /// Display-ordered key/value pairs, keyed the same way the record serializes.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("File Name", self.file_name.clone()),
            ("File Path", self.file_path.clone()),
            ("File Size", format!("{} bytes", self.file_size)),
            ("Extension", self.extension.clone()),
            ("MIME Type", self.mime_type.clone()),
        ];
        if let Some(created) = &self.created {
            entries.push(("Created", created.clone()));
        }
        if let Some(modified) = &self.modified {
            entries.push(("Modified", modified.clone()));
        }
        entries
    }
}

/// Decoded GPS tags plus signed decimal degrees when both axes were resolvable.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GpsInfo {
    #[serde(flatten)]
    pub tags: BTreeMap<String, String>,
    #[serde(rename = "decimalLatitude", default, skip_serializing_if = "Option::is_none")]
    pub decimal_latitude: Option<f64>,
    #[serde(rename = "decimalLongitude", default, skip_serializing_if = "Option::is_none")]
    pub decimal_longitude: Option<f64>,
}

impl GpsInfo {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.decimal_latitude.is_none() && self.decimal_longitude.is_none()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.decimal_latitude?, self.decimal_longitude?))
    }

    /// Stringified view used by the flat exporters.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(lat) = self.decimal_latitude {
            entries.push(("decimalLatitude".to_string(), lat.to_string()));
        }
        if let Some(lon) = self.decimal_longitude {
            entries.push(("decimalLongitude".to_string(), lon.to_string()));
        }
        entries
    }
}

/// The normalized field set of one successfully extracted file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub file_info: FileInfo,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image_info: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub camera_info: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "GpsInfo::is_empty")]
    pub gps_info: GpsInfo,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exif_info: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub video_info: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio_info: BTreeMap<String, String>,
}

impl MediaMetadata {
    pub fn new(file_info: FileInfo) -> Self {
        Self {
            file_info,
            image_info: BTreeMap::new(),
            camera_info: BTreeMap::new(),
            gps_info: GpsInfo::default(),
            exif_info: BTreeMap::new(),
            video_info: serde_json::Map::new(),
            streams: Vec::new(),
            audio_info: BTreeMap::new(),
        }
    }

    /// True when `key` is already claimed by any tag-bearing category.
    pub fn claims(&self, key: &str) -> bool {
        self.exif_info.contains_key(key)
            || self.camera_info.contains_key(key)
            || self.image_info.contains_key(key)
            || self.gps_info.tags.contains_key(key)
    }
}

/// A failed extraction. Only `error` is serialized; `partial` keeps whatever
/// was gathered before a source failed, for in-process callers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FailedRecord {
    pub error: String,
    #[serde(skip)]
    pub partial: Option<Box<MediaMetadata>>,
}

/// Normalized result for one file: either the field set or an error, never both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Record {
    Failed(FailedRecord),
    Extracted(Box<MediaMetadata>),
}

impl Record {
    pub fn failed(error: ExtractError) -> Self {
        Record::Failed(FailedRecord {
            error: error.to_string(),
            partial: None,
        })
    }

    pub fn failed_with_partial(error: ExtractError, partial: MediaMetadata) -> Self {
        Record::Failed(FailedRecord {
            error: error.to_string(),
            partial: Some(Box::new(partial)),
        })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Record::Failed(failed) => Some(&failed.error),
            Record::Extracted(_) => None,
        }
    }

    pub fn metadata(&self) -> Option<&MediaMetadata> {
        match self {
            Record::Extracted(metadata) => Some(metadata),
            Record::Failed(_) => None,
        }
    }

    pub fn is_geotagged(&self) -> bool {
        self.metadata()
            .map_or(false, |m| m.gps_info.coordinates().is_some())
    }
}

impl From<MediaMetadata> for Record {
    fn from(metadata: MediaMetadata) -> Self {
        Record::Extracted(Box::new(metadata))
    }
}

/// Path -> Record mapping produced by a batch.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ResultSet {
    records: BTreeMap<PathBuf, Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf, record: Record) -> Option<Record> {
        self.records.insert(path, record)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Record> {
        self.records.get(path.as_ref())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.records.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Record)> {
        self.records.iter()
    }

    /// Key union with `other`; entries from `other` win on duplicate paths.
    pub fn merge(&mut self, other: ResultSet) {
        self.records.extend(other.records);
    }

    /// Subset whose GPS info carries both decimal coordinates.
    pub fn filter_geotagged(&self) -> ResultSet {
        self.records
            .iter()
            .filter(|(_, record)| record.is_geotagged())
            .map(|(path, record)| (path.clone(), record.clone()))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let failed = self.records.values().filter(|r| r.error().is_some()).count();
        let geotagged = self.records.values().filter(|r| r.is_geotagged()).count();
        Summary {
            total: self.records.len(),
            succeeded: self.records.len() - failed,
            failed,
            geotagged,
        }
    }
}

impl FromIterator<(PathBuf, Record)> for ResultSet {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Record)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = (PathBuf, Record);
    type IntoIter = std::collections::btree_map::IntoIter<PathBuf, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = (&'a PathBuf, &'a Record);
    type IntoIter = std::collections::btree_map::Iter<'a, PathBuf, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub geotagged: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loaded {} files", self.succeeded)?;
        if self.failed > 0 {
            write!(f, " ({} errors)", self.failed)?;
        }
        if self.geotagged > 0 {
            write!(f, ", {} geotagged", self.geotagged)?;
        }
        Ok(())
    }
}

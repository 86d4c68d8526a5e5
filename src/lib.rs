//! Metadata extraction for images, videos and audio files.
//!
//! [`Extractor`] turns one path into a [`Record`]; [`BulkProcessor`] fans that
//! out over a worker pool and collects a [`ResultSet`], which the [`export`]
//! module writes as JSON, CSV or a plain-text report. [`remove_exif`] rewrites
//! still images without their EXIF block.

pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod gps;
pub mod media_type;
pub mod metadata;
pub mod probe;
pub mod processor;
pub mod sources;
pub mod strip;
pub mod walker;

pub use crate::config::AppConfig;
pub use crate::error::{AppError, ExtractError, SourceError};
pub use crate::export::{export, suggested_filename, ExportFormat};
pub use crate::extractor::Extractor;
pub use crate::metadata::{FileInfo, GpsInfo, MediaMetadata, Record, ResultSet, Summary};
pub use crate::processor::{filter_geotagged, Batch, BulkProcessor};
pub use crate::strip::remove_exif;

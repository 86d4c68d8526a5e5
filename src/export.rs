//! Serializers for a finished [`ResultSet`].

use crate::error::AppError;
use crate::metadata::{MediaMetadata, Record, ResultSet};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "txt" => Ok(ExportFormat::Txt),
            _ => Err(AppError::UnsupportedExportFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `{prefix}_{YYYYMMDD_HHMMSS}.{ext}` stamped with the current local time.
pub fn suggested_filename(prefix: &str, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Renders `results` and writes them to `output_path`.
pub fn export(results: &ResultSet, format: ExportFormat, output_path: &Path) -> Result<(), AppError> {
    let bytes = render(results, format)?;
    fs::write(output_path, bytes)?;
    log::info!(
        "Exported {} records as {} to {:?}",
        results.len(),
        format,
        output_path
    );
    Ok(())
}

pub fn render(results: &ResultSet, format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Json => render_json(results),
        ExportFormat::Csv => render_csv(results),
        ExportFormat::Txt => render_txt(results, Local::now()),
    }
}

/// Keys are lossy path strings, like the csv and txt renderings.
fn render_json(results: &ResultSet) -> Result<Vec<u8>, AppError> {
    let keyed: BTreeMap<String, &Record> = results
        .iter()
        .map(|(path, record)| (path.to_string_lossy().into_owned(), record))
        .collect();
    Ok(serde_json::to_vec_pretty(&keyed)?)
}

fn render_csv(results: &ResultSet) -> Result<Vec<u8>, AppError> {
    let rows: Vec<BTreeMap<String, String>> = results
        .iter()
        .filter_map(|(path, record)| {
            record
                .metadata()
                .map(|metadata| flatten(&path.to_string_lossy(), metadata))
        })
        .collect();
    if rows.is_empty() {
        return Err(AppError::NothingToExport);
    }

    let columns: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(*column).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

fn flatten(path: &str, metadata: &MediaMetadata) -> BTreeMap<String, String> {
    let mut row = BTreeMap::new();
    row.insert("File Path".to_string(), path.to_string());
    for (key, value) in metadata.file_info.entries() {
        row.insert(format!("File_{}", key), value);
    }
    for (key, value) in &metadata.exif_info {
        row.insert(format!("EXIF_{}", key), value.clone());
    }
    for (key, value) in metadata.gps_info.entries() {
        row.insert(format!("GPS_{}", key), value);
    }
    for (key, value) in &metadata.camera_info {
        row.insert(format!("Camera_{}", key), value.clone());
    }
    for (key, value) in &metadata.image_info {
        row.insert(format!("Image_{}", key), value.clone());
    }
    row
}

fn render_txt(results: &ResultSet, generated: DateTime<Local>) -> Result<Vec<u8>, AppError> {
    let rule = "=".repeat(50);
    let mut out = Vec::new();

    writeln!(out, "EXIF Viewer Export Report")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Generated: {}", generated.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "Total Files: {}", results.len())?;
    writeln!(out)?;

    for (path, record) in results {
        writeln!(out, "File: {}", path.display())?;
        writeln!(out, "{}", "-".repeat(50))?;

        let metadata = match record {
            Record::Failed(failed) => {
                writeln!(out, "Error: {}", failed.error)?;
                writeln!(out)?;
                continue;
            }
            Record::Extracted(metadata) => metadata,
        };

        let file_entries: Vec<(String, String)> = metadata
            .file_info
            .entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        write_section(&mut out, "File Information", &file_entries)?;
        write_section(&mut out, "Camera Information", &pairs(&metadata.camera_info))?;
        write_section(&mut out, "Image Information", &pairs(&metadata.image_info))?;
        write_section(&mut out, "GPS Information", &metadata.gps_info.entries())?;
        write_section(&mut out, "EXIF Data", &pairs(&metadata.exif_info))?;

        writeln!(out)?;
        writeln!(out, "{}", rule)?;
        writeln!(out)?;
    }

    Ok(out)
}

fn pairs(map: &BTreeMap<String, String>) -> Vec<(String, String)> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn write_section(out: &mut Vec<u8>, title: &str, entries: &[(String, String)]) -> std::io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}:", title)?;
    for (key, value) in entries {
        writeln!(out, "  {}: {}", key, value)?;
    }
    writeln!(out)
}

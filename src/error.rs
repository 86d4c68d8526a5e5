use exif::Error as ExifError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Crate-level failures: configuration, export, EXIF removal and pool setup.
/// Per-file problems never surface here; they become `Record::Failed`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] SerdeJsonError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG error: {0}")]
    Jpeg(#[from] img_parts::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedExportFormat(String),

    #[error("No successfully extracted records to export")]
    NothingToExport,
}

/// Why a single file could not be extracted. The `Display` text is what ends
/// up in the record's `error` field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("File not found")]
    NotFound,

    #[error("Unsupported file format")]
    UnsupportedFormat,

    #[error("Error reading {context}: {cause}")]
    SourceRead { context: &'static str, cause: String },

    #[error("{0}")]
    CapabilityMissing(String),

    #[error("Exception occurred: {0}")]
    Task(String),

    #[error("Failed to extract EXIF data: {0}")]
    Unexpected(String),
}

/// Failure raised by a metadata source or external collaborator.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Exif(#[from] ExifError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] SerdeJsonError),

    #[cfg(feature = "audio-tags")]
    #[error(transparent)]
    Audio(#[from] lofty::error::LoftyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_messages() {
        assert_eq!(ExtractError::NotFound.to_string(), "File not found");
        assert_eq!(ExtractError::UnsupportedFormat.to_string(), "Unsupported file format");
        let err = ExtractError::SourceRead {
            context: "video metadata",
            cause: "bad json".to_string(),
        };
        assert_eq!(err.to_string(), "Error reading video metadata: bad json");
        assert_eq!(
            ExtractError::Task("boom".to_string()).to_string(),
            "Exception occurred: boom"
        );
        assert_eq!(
            ExtractError::Unexpected("oops".to_string()).to_string(),
            "Failed to extract EXIF data: oops"
        );
    }
}

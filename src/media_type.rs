use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".tiff", ".tif", ".png", ".bmp", ".gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".mkv", ".wmv"];
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".flac", ".m4a"];

/// Category a file is dispatched under, resolved once from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Unsupported,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        match extension_of(path) {
            Some(ext) => Self::from_extension(&ext),
            None => MediaKind::Unsupported,
        }
    }

    /// Classifies a lowercase, dot-prefixed extension such as `".jpg"`.
    pub fn from_extension(ext: &str) -> Self {
        if IMAGE_EXTENSIONS.contains(&ext) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            MediaKind::Audio
        } else {
            MediaKind::Unsupported
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
            MediaKind::Unsupported => "Other",
        }
    }
}

/// Lowercase, dot-prefixed extension of `path`, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}

pub fn is_supported(path: &Path) -> bool {
    MediaKind::from_path(path) != MediaKind::Unsupported
}

pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    IMAGE_EXTENSIONS
        .iter()
        .chain(VIDEO_EXTENSIONS)
        .chain(AUDIO_EXTENSIONS)
        .copied()
}

/// Groups paths by lowercase extension, keeping the input order inside each group.
pub fn group_by_extension(paths: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut grouped: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        let ext = extension_of(path).unwrap_or_default();
        grouped.entry(ext).or_default().push(path.clone());
    }
    grouped
}

pub fn format_file_size(size_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if size_bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = size_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_case_insensitive() {
        assert_eq!(MediaKind::from_path(Path::new("a/IMG_001.JPG")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("clip.MoV")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("song.mp3")), MediaKind::Audio);
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), MediaKind::Unsupported);
        assert_eq!(MediaKind::from_path(Path::new("Makefile")), MediaKind::Unsupported);
    }

    #[test]
    fn test_supported_file_detection() {
        for name in ["test.jpg", "test.jpeg", "test.png", "test.gif", "test.mp4", "test.avi"] {
            assert!(is_supported(Path::new(name)), "{name} should be supported");
        }
        assert!(!is_supported(Path::new("test.txt")));
        assert!(!is_supported(Path::new("test.doc")));
        assert_eq!(supported_extensions().count(), 16);
    }

    #[test]
    fn test_group_by_extension() {
        let paths = vec![
            PathBuf::from("a.jpg"),
            PathBuf::from("b.JPG"),
            PathBuf::from("c.mp4"),
        ];
        let grouped = group_by_extension(&paths);
        assert_eq!(grouped[".jpg"].len(), 2);
        assert_eq!(grouped[".mp4"], vec![PathBuf::from("c.mp4")]);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(40.4461, -79.9486));
        assert!(!validate_coordinates(91.0, 0.0));
        assert!(!validate_coordinates(0.0, -180.5));
    }
}

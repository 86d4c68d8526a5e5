use crate::media_type::is_supported;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported media files under `dir`, sorted ascending.
///
/// A missing path or a non-directory yields an empty list.
pub fn scan_directory(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        log::debug!("Not a directory, nothing to scan: {:?}", dir);
        return Vec::new();
    }

    log::info!("Starting file discovery in {:?} (recursive: {})", dir, recursive);
    let mut walker = WalkDir::new(dir).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(err) => {
            log::warn!("Skipping unreadable entry: {}", err);
            None
        }
    }) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", path);
            continue;
        }
        if is_supported(path) {
            log::trace!("Discovered media file: {:?}", path);
            files.push(path.to_path_buf());
        } else {
            log::trace!("Skipping file due to unsupported extension: {:?}", path);
        }
    }

    files.sort();
    log::info!("File discovery complete: {} supported files.", files.len());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_directory_scanning() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg", "notes.txt"] {
            touch(&dir.path().join(name));
        }

        let files = scan_directory(dir.path(), false);
        let expected: Vec<PathBuf> = ["a.jpg", "b.jpg", "c.jpg"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();
        assert_eq!(files, expected);
        assert_eq!(scan_directory(dir.path(), true), expected);
    }

    #[test]
    fn test_recursion_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2024").join("trip");
        fs::create_dir_all(&nested).unwrap();
        touch(&dir.path().join("top.JPG"));
        touch(&nested.join("deep.mp4"));
        touch(&nested.join("deep.txt"));

        let flat = scan_directory(dir.path(), false);
        assert_eq!(flat, vec![dir.path().join("top.JPG")]);

        let recursive = scan_directory(dir.path(), true);
        assert_eq!(
            recursive,
            vec![nested.join("deep.mp4"), dir.path().join("top.JPG")]
        );
    }

    #[test]
    fn test_missing_or_file_input_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_directory(&dir.path().join("nope"), true).is_empty());

        let file = dir.path().join("a.jpg");
        touch(&file);
        assert!(scan_directory(&file, true).is_empty());
    }
}

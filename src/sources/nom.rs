use super::{MetadataSource, RawTag, SourceReading};
use crate::error::SourceError;
use crate::media_type::extension_of;
use nom_exif::parse_exif;
use std::fs::File;
use std::path::Path;

const IFD_CONTAINERS: &[&str] = &[".jpg", ".jpeg", ".tif", ".tiff"];

/// Supplementary source: walks every IFD entry nom-exif can parse, including
/// tags the primary reader has no name for. GPS entries are left to the
/// primary source.
pub struct NomExifSource;

impl MetadataSource for NomExifSource {
    fn name(&self) -> &'static str {
        "nom-exif"
    }

    #[allow(deprecated)]
    fn read_tags(&self, path: &Path) -> Result<SourceReading, SourceError> {
        match extension_of(path) {
            Some(ext) if IFD_CONTAINERS.contains(&ext.as_str()) => {}
            _ => return Ok(SourceReading::default()),
        }

        let file = File::open(path)?;
        let iter = match parse_exif(file, None) {
            Ok(Some(iter)) => iter,
            Ok(None) => {
                log::debug!("nom-exif found no IFD entries in {:?}", path);
                return Ok(SourceReading::default());
            }
            // The primary source reports malformed blocks; nothing to add here.
            Err(e) => {
                log::debug!("nom-exif could not parse {:?}: {}", path, e);
                return Ok(SourceReading::default());
            }
        };

        let mut tags = Vec::new();
        for entry in iter {
            let name = match entry.tag() {
                Some(tag) => format!("{:?}", tag),
                None => format!("0x{:04x}", entry.tag_code()),
            };
            if name.starts_with("GPS") {
                continue;
            }
            if let Some(value) = entry.get_value() {
                tags.push(RawTag::text(name, value.to_string()));
            }
        }
        log::debug!("nom-exif read {} entries from {:?}", tags.len(), path);

        Ok(SourceReading {
            tags,
            container: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::fixtures::{pittsburgh_tiff, write_exif_jpeg};
    use crate::sources::RawValue;

    #[test]
    fn test_skips_containers_without_ifds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(2, 2).save(&path).unwrap();

        let reading = NomExifSource.read_tags(&path).unwrap();
        assert_eq!(reading, SourceReading::default());
    }

    #[test]
    fn test_reads_ifd_entries_and_leaves_gps_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exif_jpeg(dir.path(), "tagged.jpg", &pittsburgh_tiff());

        let reading = NomExifSource.read_tags(&path).unwrap();
        assert!(reading.container.is_none());
        assert!(reading
            .tags
            .iter()
            .any(|t| t.name == "Make" && matches!(&t.value, RawValue::Text(v) if v.contains("Canon"))));
        assert!(reading.tags.iter().all(|t| !t.name.starts_with("GPS")));
    }

    #[test]
    fn test_jpeg_without_exif_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        image::RgbImage::new(8, 8).save(&path).unwrap();
        assert_eq!(NomExifSource.read_tags(&path).unwrap(), SourceReading::default());
    }
}

use crate::audio::{self, AudioError};
use crate::config::AppConfig;
use crate::error::ExtractError;
use crate::gps::decode_gps;
use crate::media_type::{extension_of, MediaKind};
use crate::metadata::{FileInfo, MediaMetadata, Record};
use crate::probe::VideoProbe;
use crate::sources::{default_sources, ContainerFields, MetadataSource, RawValue, SourceReading};
use chrono::{DateTime, Local};
use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::{Duration, SystemTime};

const CAMERA_TAGS: &[&str] = &["Make", "Model", "LensMake", "LensModel"];
const IMAGE_TAGS: &[&str] = &["ImageWidth", "ImageLength", "Orientation", "ColorSpace"];

/// Turns one path into one normalized [`Record`].
pub struct Extractor {
    sources: Vec<Box<dyn MetadataSource>>,
    probe: VideoProbe,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(default_sources(), VideoProbe::default())
    }
}

impl Extractor {
    /// `sources` are consulted in order; the first one is authoritative.
    pub fn new(sources: Vec<Box<dyn MetadataSource>>, probe: VideoProbe) -> Self {
        Self { sources, probe }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let probe = VideoProbe::new(
            &config.ffprobe_path,
            Duration::from_secs(config.probe_timeout_secs),
        );
        Self::new(default_sources(), probe)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        MediaKind::from_path(path) != MediaKind::Unsupported
    }

    /// Never panics and never returns an error: every failure is captured in
    /// the record.
    pub fn extract(&self, path: &Path) -> Record {
        if !path.exists() {
            log::debug!("File not found: {:?}", path);
            return Record::failed(ExtractError::NotFound);
        }

        let kind = MediaKind::from_path(path);
        log::trace!("Extracting {:?} as {}", path, kind.label());
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(path, kind))) {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                log::warn!("Failed to extract {:?}: {}", path, e);
                Record::failed(ExtractError::Unexpected(e.to_string()))
            }
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                log::warn!("Extraction of {:?} panicked: {}", path, cause);
                Record::failed(ExtractError::Unexpected(cause))
            }
        }
    }

    fn dispatch(&self, path: &Path, kind: MediaKind) -> io::Result<Record> {
        if kind == MediaKind::Unsupported {
            return Ok(Record::failed(ExtractError::UnsupportedFormat));
        }

        let metadata = MediaMetadata::new(file_info(path)?);
        Ok(match kind {
            MediaKind::Image => self.extract_image(path, metadata),
            MediaKind::Video => self.extract_video(path, metadata),
            MediaKind::Audio => extract_audio(path, metadata),
            MediaKind::Unsupported => Record::failed(ExtractError::UnsupportedFormat),
        })
    }

    fn extract_image(&self, path: &Path, mut metadata: MediaMetadata) -> Record {
        for (rank, source) in self.sources.iter().enumerate() {
            log::debug!("Querying {} for {:?}", source.name(), path);
            match source.read_tags(path) {
                Ok(reading) if rank == 0 => classify(&mut metadata, reading),
                Ok(reading) => supplement(&mut metadata, reading),
                Err(e) => {
                    log::warn!("{} failed on {:?}: {}", source.name(), path, e);
                    let error = ExtractError::SourceRead {
                        context: "image EXIF",
                        cause: e.to_string(),
                    };
                    return Record::failed_with_partial(error, metadata);
                }
            }
        }
        metadata.into()
    }

    fn extract_video(&self, path: &Path, mut metadata: MediaMetadata) -> Record {
        match self.probe.probe(path) {
            Ok(Some(output)) => {
                log::debug!("Probed {:?}: {} streams", path, output.streams.len());
                metadata.video_info = output.format;
                metadata.streams = output.streams;
            }
            Ok(None) => log::debug!("No probe data for {:?}", path),
            Err(e) => {
                log::warn!("Failed to probe {:?}: {}", path, e);
                let error = ExtractError::SourceRead {
                    context: "video metadata",
                    cause: e.to_string(),
                };
                return Record::failed_with_partial(error, metadata);
            }
        }
        metadata.into()
    }
}

/// Only `.mp3` is read; other audio containers keep an empty `audioInfo`.
fn extract_audio(path: &Path, mut metadata: MediaMetadata) -> Record {
    if extension_of(path).as_deref() != Some(".mp3") {
        return metadata.into();
    }

    match audio::read_mp3(path) {
        Ok(reading) => {
            metadata.audio_info = reading.info;
            metadata.exif_info.extend(reading.tags);
            metadata.into()
        }
        Err(AudioError::Unavailable(message)) => {
            Record::failed_with_partial(ExtractError::CapabilityMissing(message.to_string()), metadata)
        }
        Err(AudioError::Read(e)) => {
            log::warn!("Failed to read audio tags of {:?}: {}", path, e);
            let error = ExtractError::SourceRead {
                context: "audio metadata",
                cause: e.to_string(),
            };
            Record::failed_with_partial(error, metadata)
        }
    }
}

/// Sorts the authoritative source's tags into their categories.
fn classify(metadata: &mut MediaMetadata, reading: SourceReading) {
    for tag in reading.tags {
        match tag.value {
            RawValue::Gps(ifd) => metadata.gps_info = decode_gps(&ifd),
            RawValue::Text(_) if tag.name == "GPSInfo" => {
                log::debug!("Ignoring undecodable GPSInfo value");
            }
            RawValue::Text(value) if CAMERA_TAGS.contains(&tag.name.as_str()) => {
                metadata.camera_info.insert(tag.name, value);
            }
            RawValue::Text(value) if IMAGE_TAGS.contains(&tag.name.as_str()) => {
                metadata.image_info.insert(tag.name, value);
            }
            RawValue::Text(value) => {
                metadata.exif_info.insert(tag.name, value);
            }
        }
    }
    apply_container(metadata, reading.container.as_ref());
}

/// Later sources only fill gaps: claimed keys and GPS values are left alone.
fn supplement(metadata: &mut MediaMetadata, reading: SourceReading) {
    for tag in reading.tags {
        if let RawValue::Text(value) = tag.value {
            if !metadata.claims(&tag.name) {
                metadata.exif_info.insert(tag.name, value);
            }
        }
    }
    if !metadata.image_info.contains_key("Format") {
        apply_container(metadata, reading.container.as_ref());
    }
}

fn apply_container(metadata: &mut MediaMetadata, container: Option<&ContainerFields>) {
    if let Some(container) = container {
        metadata.image_info.insert("Format".to_string(), container.format.clone());
        metadata.image_info.insert("Mode".to_string(), container.mode.clone());
        metadata.image_info.insert(
            "Size".to_string(),
            format!("{}x{}", container.width, container.height),
        );
    }
}

fn file_info(path: &Path) -> io::Result<FileInfo> {
    let stat = fs::metadata(path)?;
    let absolute = fs::canonicalize(path)?;

    Ok(FileInfo {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        file_path: absolute.to_string_lossy().to_string(),
        file_size: stat.len(),
        extension: extension_of(path).unwrap_or_default(),
        mime_type: mime_guess::from_path(path).first_or_octet_stream().to_string(),
        created: stat.created().ok().map(format_timestamp),
        modified: stat.modified().ok().map(format_timestamp),
    })
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::gps::{GpsIfd, GpsValue, LATITUDE, LATITUDE_REF, LONGITUDE, LONGITUDE_REF};
    use crate::sources::fixtures::{pittsburgh_tiff, write_exif_jpeg};
    use crate::sources::RawTag;
    use std::path::PathBuf;

    struct FixedSource(SourceReading);

    impl MetadataSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn read_tags(&self, _path: &Path) -> Result<SourceReading, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl MetadataSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn read_tags(&self, _path: &Path) -> Result<SourceReading, SourceError> {
            Err(io::Error::new(io::ErrorKind::Other, "corrupt IFD").into())
        }
    }

    struct PanickingSource;

    impl MetadataSource for PanickingSource {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn read_tags(&self, _path: &Path) -> Result<SourceReading, SourceError> {
            panic!("decoder exploded")
        }
    }

    fn primary_reading() -> SourceReading {
        let mut gps = GpsIfd::new();
        gps.insert(LATITUDE_REF, GpsValue::Text("N".to_string()));
        gps.insert(LATITUDE, GpsValue::Rationals(vec![40.0, 26.0, 46.0]));
        gps.insert(LONGITUDE_REF, GpsValue::Text("W".to_string()));
        gps.insert(LONGITUDE, GpsValue::Rationals(vec![79.0, 56.0, 55.0]));

        SourceReading {
            tags: vec![
                RawTag::text("Make", "Canon"),
                RawTag::text("LensModel", "EF 50mm"),
                RawTag::text("Orientation", "row 0 at top"),
                RawTag::text("ExposureTime", "1/250"),
                RawTag {
                    name: "GPSInfo".to_string(),
                    value: RawValue::Gps(gps),
                },
            ],
            container: Some(ContainerFields {
                format: "JPEG".to_string(),
                mode: "RGB".to_string(),
                width: 640,
                height: 480,
            }),
        }
    }

    fn secondary_reading() -> SourceReading {
        SourceReading {
            tags: vec![
                RawTag::text("Make", "CANON INC."),
                RawTag::text("ExposureTime", "0.004"),
                RawTag::text("FNumber", "2.8"),
            ],
            container: None,
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"stub").unwrap();
        path
    }

    fn write_jpeg(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(100, 100, image::Rgb([255, 0, 0]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_nonexistent_file() {
        let record = Extractor::default().extract(Path::new("nonexistent.jpg"));
        assert_eq!(record.error(), Some("File not found"));
        assert!(record.metadata().is_none());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "notes.txt");
        let record = Extractor::default().extract(&path);
        assert_eq!(record.error(), Some("Unsupported file format"));
    }

    #[test]
    fn test_extract_image_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_jpeg(dir.path(), "test_image.jpg");

        let record = Extractor::default().extract(&path);
        let metadata = record.metadata().expect("plain jpeg should extract");
        assert_eq!(metadata.file_info.file_name, "test_image.jpg");
        assert_eq!(metadata.file_info.extension, ".jpg");
        assert_eq!(metadata.file_info.mime_type, "image/jpeg");
        assert!(metadata.file_info.file_size > 0);
        assert!(Path::new(&metadata.file_info.file_path).is_absolute());
        assert_eq!(metadata.image_info["Format"], "JPEG");
        assert_eq!(metadata.image_info["Mode"], "RGB");
        assert_eq!(metadata.image_info["Size"], "100x100");
        assert!(metadata.camera_info.is_empty());
        assert!(metadata.gps_info.is_empty());
    }

    #[test]
    fn test_classification_and_primary_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "shot.jpg");
        let extractor = Extractor::new(
            vec![
                Box::new(FixedSource(primary_reading())),
                Box::new(FixedSource(secondary_reading())),
            ],
            VideoProbe::default(),
        );

        let record = extractor.extract(&path);
        let metadata = record.metadata().unwrap();
        assert_eq!(metadata.camera_info["Make"], "Canon");
        assert_eq!(metadata.camera_info["LensModel"], "EF 50mm");
        assert_eq!(metadata.image_info["Orientation"], "row 0 at top");
        assert_eq!(metadata.image_info["Size"], "640x480");
        assert_eq!(metadata.exif_info["ExposureTime"], "1/250");
        assert_eq!(metadata.exif_info["FNumber"], "2.8");
        assert!(!metadata.exif_info.contains_key("Make"));
        assert!(!metadata.exif_info.keys().any(|k| k.starts_with("GPS")));

        let (lat, lon) = metadata.gps_info.coordinates().unwrap();
        assert!((lat - 40.446111).abs() < 1e-4);
        assert!((lon - -79.948611).abs() < 1e-4);
        assert_eq!(metadata.gps_info.tags["GPSLongitudeRef"], "W");
    }

    #[test]
    fn test_secondary_failure_keeps_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "shot.jpg");
        let extractor = Extractor::new(
            vec![Box::new(FixedSource(primary_reading())), Box::new(FailingSource)],
            VideoProbe::default(),
        );

        match extractor.extract(&path) {
            Record::Failed(failed) => {
                assert_eq!(failed.error, "Error reading image EXIF: corrupt IFD");
                let partial = failed.partial.expect("primary fields should survive");
                assert_eq!(partial.camera_info["Make"], "Canon");
                assert_eq!(partial.file_info.file_name, "shot.jpg");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_source_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "shot.png");
        let extractor = Extractor::new(vec![Box::new(PanickingSource)], VideoProbe::default());

        let record = extractor.extract(&path);
        assert_eq!(record.error(), Some("Failed to extract EXIF data: decoder exploded"));
    }

    #[test]
    fn test_video_without_probe_binary_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "clip.mp4");
        let extractor = Extractor::new(
            Vec::new(),
            VideoProbe::new("no-such-ffprobe-binary", Duration::from_secs(1)),
        );

        let metadata = extractor.extract(&path).metadata().cloned().unwrap();
        assert_eq!(metadata.file_info.extension, ".mp4");
        assert!(metadata.video_info.is_empty());
        assert!(metadata.streams.is_empty());
    }

    #[test]
    fn test_non_mp3_audio_has_empty_audio_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "voice.wav");

        let record = Extractor::default().extract(&path);
        let metadata = record.metadata().unwrap();
        assert!(metadata.audio_info.is_empty());
        assert!(metadata.file_info.mime_type.starts_with("audio/"));
    }

    #[cfg(feature = "audio-tags")]
    #[test]
    fn test_unreadable_mp3_reports_audio_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "broken.mp3");

        let record = Extractor::default().extract(&path);
        assert!(record
            .error()
            .unwrap()
            .starts_with("Error reading audio metadata: "));
    }

    #[test]
    fn test_exactly_one_of_fields_or_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_jpeg(dir.path(), "ok.jpg"),
            touch(dir.path(), "broken.png"),
            touch(dir.path(), "readme.md"),
            dir.path().join("missing.gif"),
        ];
        let extractor = Extractor::default();
        for path in paths {
            let json = serde_json::to_value(extractor.extract(&path)).unwrap();
            let object = json.as_object().unwrap();
            assert!(
                object.contains_key("error") != object.contains_key("fileInfo"),
                "{:?} produced {}",
                path,
                json
            );
            if object.contains_key("error") {
                assert_eq!(object.len(), 1);
            }
        }
    }

    #[test]
    fn test_real_exif_block_through_default_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exif_jpeg(dir.path(), "tagged.jpg", &pittsburgh_tiff());

        let record = Extractor::default().extract(&path);
        let metadata = record.metadata().unwrap();
        assert_eq!(metadata.camera_info.get("Make").map(String::as_str), Some("Canon"));
        assert_eq!(metadata.gps_info.tags.get("GPSLatitudeRef").map(String::as_str), Some("N"));
        let (lat, lon) = metadata.gps_info.coordinates().unwrap();
        assert!((lat - 40.4461).abs() < 1e-4);
        assert!((lon + 79.9486).abs() < 1e-4);
        assert!(!metadata.exif_info.contains_key("Make"));
        assert!(metadata.exif_info.keys().all(|k| !k.starts_with("GPS")));
        assert_eq!(metadata.image_info.get("Size").map(String::as_str), Some("32x24"));
    }

    #[test]
    fn test_truncated_jpeg_keeps_container_fields() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.jpg");
        image::RgbImage::from_fn(256, 256, |x, y| image::Rgb([x as u8, y as u8, (x ^ y) as u8]))
            .save(&full)
            .unwrap();
        let bytes = fs::read(&full).unwrap();
        let cut = dir.path().join("cut.jpg");
        fs::write(&cut, &bytes[..bytes.len() / 2]).unwrap();

        let record = Extractor::default().extract(&cut);
        assert!(record.error().is_none(), "{:?}", record.error());
        let image_info = &record.metadata().unwrap().image_info;
        assert_eq!(image_info["Format"], "JPEG");
        assert_eq!(image_info["Mode"], "RGB");
        assert_eq!(image_info["Size"], "256x256");
    }
}

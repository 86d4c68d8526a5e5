use super::{ContainerFields, MetadataSource, RawTag, RawValue, SourceReading};
use crate::error::SourceError;
use crate::gps::{GpsIfd, GpsValue};
use crate::media_type::extension_of;
use exif::{Context, Field, In, Reader, Tag, Value};
use image::codecs::{
    bmp::BmpDecoder, gif::GifDecoder, jpeg::JpegDecoder, png::PngDecoder, tiff::TiffDecoder,
};
use image::{ColorType, ImageDecoder, ImageFormat};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Containers kamadak-exif can locate an EXIF block in.
const EXIF_CONTAINERS: &[&str] = &[".jpg", ".jpeg", ".tif", ".tiff", ".png"];

/// Primary source: EXIF fields of the main image plus decoded container facts.
pub struct ExifSource;

impl MetadataSource for ExifSource {
    fn name(&self) -> &'static str {
        "kamadak-exif"
    }

    fn read_tags(&self, path: &Path) -> Result<SourceReading, SourceError> {
        log::trace!("Extracting EXIF data for image: {:?}", path);
        let tags = match extension_of(path) {
            Some(ext) if EXIF_CONTAINERS.contains(&ext.as_str()) => read_exif_tags(path)?,
            _ => Vec::new(),
        };

        log::trace!("Decoding image container: {:?}", path);
        let container = read_container(path)?;
        log::debug!(
            "Container for {:?}: {} {} {}x{}",
            path,
            container.format,
            container.mode,
            container.width,
            container.height
        );

        Ok(SourceReading {
            tags,
            container: Some(container),
        })
    }
}

fn read_exif_tags(path: &Path) -> Result<Vec<RawTag>, SourceError> {
    let file = File::open(path)?;
    let mut buf_reader = BufReader::new(file);
    let mut exif_reader = Reader::new();
    exif_reader.continue_on_error(true);

    let exif = match exif_reader.read_from_container(&mut buf_reader) {
        Ok(exif) => exif,
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            log::debug!("Partial EXIF for {:?}: {} fields skipped", path, errors.len());
            exif
        }
        Err(exif::Error::NotFound(_)) => {
            log::debug!("No EXIF data found for {:?}", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut tags = Vec::new();
    let mut gps = GpsIfd::new();
    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY || is_pointer(field.tag) {
            continue;
        }
        if field.tag.context() == Context::Gps {
            gps.insert(field.tag.number(), gps_value(field));
            continue;
        }
        log::trace!("{}: {}", field.tag, field.display_value());
        tags.push(RawTag::text(field.tag.to_string(), display_value(field)));
    }
    if !gps.is_empty() {
        tags.push(RawTag {
            name: "GPSInfo".to_string(),
            value: RawValue::Gps(gps),
        });
    }

    Ok(tags)
}

fn is_pointer(tag: Tag) -> bool {
    tag == Tag::ExifIFDPointer || tag == Tag::GPSInfoIFDPointer || tag == Tag::InteropIFDPointer
}

fn display_value(field: &Field) -> String {
    field.display_value().to_string().trim_matches('"').to_string()
}

fn gps_value(field: &Field) -> GpsValue {
    match &field.value {
        Value::Rational(parts) => GpsValue::Rationals(parts.iter().map(|r| r.to_f64()).collect()),
        Value::Ascii(strings) => GpsValue::Text(
            strings
                .first()
                .map(|s| String::from_utf8_lossy(s).trim_end_matches('\0').to_string())
                .unwrap_or_default(),
        ),
        _ => GpsValue::Other(display_value(field)),
    }
}

/// Header-only read: pixel data is never decoded, so a damaged scan still
/// yields format, mode and size.
fn read_container(path: &Path) -> Result<ContainerFields, SourceError> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    let Some(format) = reader.format() else {
        // Fails with the decoder's own "unsupported format" error.
        let (width, height) = reader.into_dimensions()?;
        return Ok(ContainerFields {
            format: "UNKNOWN".to_string(),
            mode: "UNKNOWN".to_string(),
            width,
            height,
        });
    };

    let file = BufReader::new(File::open(path)?);
    let (width, height, color) = match format {
        ImageFormat::Jpeg => header(JpegDecoder::new(file)?),
        ImageFormat::Png => header(PngDecoder::new(file)?),
        ImageFormat::Gif => header(GifDecoder::new(file)?),
        ImageFormat::Bmp => header(BmpDecoder::new(file)?),
        ImageFormat::Tiff => header(TiffDecoder::new(file)?),
        _ => {
            let (width, height) = reader.into_dimensions()?;
            (width, height, None)
        }
    };

    Ok(ContainerFields {
        format: format_name(format),
        mode: color.map_or("UNKNOWN", color_mode).to_string(),
        width,
        height,
    })
}

fn header<'a, D: ImageDecoder<'a>>(decoder: D) -> (u32, u32, Option<ColorType>) {
    let (width, height) = decoder.dimensions();
    (width, height, Some(decoder.color_type()))
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

/// Conventional short color-mode names ("RGB", "L", ...).
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;32F",
        ColorType::Rgba32F => "RGBA;32F",
        _ => "UNKNOWN",
    }
}

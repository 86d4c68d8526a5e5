//! EXIF removal for still images.

use crate::error::AppError;
use crate::media_type::extension_of;
use image::ImageFormat;
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};
use std::fs;
use std::path::Path;

/// Rewrites `path` without its EXIF block, to `output` or in place.
///
/// JPEGs lose their APP1 Exif segment and keep every other segment as is.
/// PNG, BMP and GIF are re-encoded from their pixels, which carries no
/// metadata over. Any other format is left alone and reported as `Ok(false)`.
pub fn remove_exif(path: &Path, output: Option<&Path>) -> Result<bool, AppError> {
    let output = output.unwrap_or(path);
    match extension_of(path).as_deref() {
        Some(".jpg") | Some(".jpeg") => {
            let mut jpeg = Jpeg::from_bytes(Bytes::from(fs::read(path)?))?;
            jpeg.set_exif(None);
            let mut bytes = Vec::new();
            jpeg.encoder().write_to(&mut bytes)?;
            fs::write(output, bytes)?;
        }
        Some(".png") | Some(".bmp") | Some(".gif") => {
            let format = ImageFormat::from_path(path)?;
            image::open(path)?.save_with_format(output, format)?;
        }
        _ => {
            log::debug!("No EXIF removal available for {:?}", path);
            return Ok(false);
        }
    }
    log::info!("Removed EXIF data from {:?} into {:?}", path, output);
    Ok(true)
}

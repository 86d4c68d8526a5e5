//! MP3 stream properties and tag frames.
//!
//! Tag support is a compile-time capability: without the `audio-tags` feature
//! every MP3 read reports [`AudioError::Unavailable`].

use crate::error::SourceError;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioReading {
    pub info: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug)]
pub enum AudioError {
    Unavailable(&'static str),
    Read(SourceError),
}

pub const CAPABILITY_MISSING: &str =
    "Audio tag support is not built in; enable the `audio-tags` feature for full audio metadata support";

pub fn is_available() -> bool {
    cfg!(feature = "audio-tags")
}

#[cfg(feature = "audio-tags")]
pub fn read_mp3(path: &Path) -> Result<AudioReading, AudioError> {
    use lofty::prelude::*;
    use lofty::tag::ItemValue;

    let tagged_file = lofty::read_from_path(path).map_err(|e| AudioError::Read(e.into()))?;
    let properties = tagged_file.properties();

    let mut reading = AudioReading::default();
    reading.info.insert(
        "Length".to_string(),
        format!("{:.2} seconds", properties.duration().as_secs_f64()),
    );
    if let Some(kbps) = properties.audio_bitrate() {
        reading
            .info
            .insert("Bitrate".to_string(), format!("{} bps", u64::from(kbps) * 1000));
    }
    if let Some(hz) = properties.sample_rate() {
        reading.info.insert("Sample Rate".to_string(), format!("{} Hz", hz));
    }

    for tag in tagged_file.tags() {
        for item in tag.items() {
            let key = format!("{:?}", item.key());
            // Multi-valued keys repeat as separate items; the first one wins.
            if reading.tags.contains_key(&key) {
                continue;
            }
            let value = match item.value() {
                ItemValue::Text(text) | ItemValue::Locator(text) => text.clone(),
                ItemValue::Binary(bytes) => format!("<{} bytes>", bytes.len()),
            };
            reading.tags.insert(key, value);
        }
    }
    log::debug!("Read {} audio tag items from {:?}", reading.tags.len(), path);

    Ok(reading)
}

#[cfg(not(feature = "audio-tags"))]
pub fn read_mp3(path: &Path) -> Result<AudioReading, AudioError> {
    log::debug!("Skipping audio tags for {:?}: capability not built in", path);
    Err(AudioError::Unavailable(CAPABILITY_MISSING))
}

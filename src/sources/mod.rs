//! Metadata sources: collaborators that read raw tags out of a media file.
//!
//! Sources are consulted in priority order. The first source defines the
//! classified fields; later ones only fill keys nobody claimed yet.

mod kamadak;
mod nom;

use crate::error::SourceError;
use crate::gps::GpsIfd;
use std::path::Path;

pub use kamadak::ExifSource;
pub use nom::NomExifSource;

/// Value of one raw tag. `GPSInfo` carries the whole GPS IFD.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Gps(GpsIfd),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    pub name: String,
    pub value: RawValue,
}

impl RawTag {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: RawValue::Text(value.into()),
        }
    }
}

/// Container-level facts, independent of any tag block.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerFields {
    pub format: String,
    pub mode: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceReading {
    pub tags: Vec<RawTag>,
    pub container: Option<ContainerFields>,
}

pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn read_tags(&self, path: &Path) -> Result<SourceReading, SourceError>;
}

/// Primary EXIF reader first, supplementary IFD scan second.
pub fn default_sources() -> Vec<Box<dyn MetadataSource>> {
    vec![Box::new(ExifSource), Box::new(NomExifSource)]
}

//! Decoding of the GPS IFD into named tags and signed decimal degrees.

use crate::media_type::validate_coordinates;
use crate::metadata::GpsInfo;
use std::collections::BTreeMap;
use std::fmt;

pub const LATITUDE_REF: u16 = 1;
pub const LATITUDE: u16 = 2;
pub const LONGITUDE_REF: u16 = 3;
pub const LONGITUDE: u16 = 4;

/// Standard GPS IFD tag names, indexed by tag number.
const GPS_TAG_NAMES: [&str; 32] = [
    "GPSVersionID",
    "GPSLatitudeRef",
    "GPSLatitude",
    "GPSLongitudeRef",
    "GPSLongitude",
    "GPSAltitudeRef",
    "GPSAltitude",
    "GPSTimeStamp",
    "GPSSatellites",
    "GPSStatus",
    "GPSMeasureMode",
    "GPSDOP",
    "GPSSpeedRef",
    "GPSSpeed",
    "GPSTrackRef",
    "GPSTrack",
    "GPSImgDirectionRef",
    "GPSImgDirection",
    "GPSMapDatum",
    "GPSDestLatitudeRef",
    "GPSDestLatitude",
    "GPSDestLongitudeRef",
    "GPSDestLongitude",
    "GPSDestBearingRef",
    "GPSDestBearing",
    "GPSDestDistanceRef",
    "GPSDestDistance",
    "GPSProcessingMethod",
    "GPSAreaInformation",
    "GPSDateStamp",
    "GPSDifferential",
    "GPSHPositioningError",
];

/// A raw GPS IFD value as handed over by a metadata source.
#[derive(Debug, Clone, PartialEq)]
pub enum GpsValue {
    Text(String),
    Rationals(Vec<f64>),
    Other(String),
}

impl fmt::Display for GpsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsValue::Text(text) | GpsValue::Other(text) => f.write_str(text),
            GpsValue::Rationals(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| format!("{:?}", p)).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

/// GPS IFD contents keyed by tag number.
pub type GpsIfd = BTreeMap<u16, GpsValue>;

pub fn gps_tag_name(index: u16) -> String {
    GPS_TAG_NAMES
        .get(index as usize)
        .map(|name| name.to_string())
        .unwrap_or_else(|| index.to_string())
}

pub fn decode_gps(raw: &GpsIfd) -> GpsInfo {
    let mut info = GpsInfo::default();
    for (index, value) in raw {
        info.tags.insert(gps_tag_name(*index), value.to_string());
    }

    match decimal_coordinates(raw) {
        Some((lat, lon)) if validate_coordinates(lat, lon) => {
            log::trace!("Decoded GPS position: {}, {}", lat, lon);
            info.decimal_latitude = Some(lat);
            info.decimal_longitude = Some(lon);
        }
        Some((lat, lon)) => {
            log::debug!("Discarding out-of-range GPS position: {}, {}", lat, lon);
        }
        None => {}
    }

    info
}

fn decimal_coordinates(raw: &GpsIfd) -> Option<(f64, f64)> {
    let mut lat = to_degrees(raw.get(&LATITUDE)?)?;
    let mut lon = to_degrees(raw.get(&LONGITUDE)?)?;

    if matches!(raw.get(&LATITUDE_REF), Some(GpsValue::Text(r)) if r == "S") {
        lat = -lat;
    }
    if matches!(raw.get(&LONGITUDE_REF), Some(GpsValue::Text(r)) if r == "W") {
        lon = -lon;
    }
    Some((lat, lon))
}

/// `d + m/60 + s/3600`; anything but a degree/minute/second triple counts as `0.0`.
fn to_degrees(value: &GpsValue) -> Option<f64> {
    match value {
        GpsValue::Rationals(parts) => match parts.as_slice() {
            [d, m, s] => Some(d + m / 60.0 + s / 3600.0),
            _ => Some(0.0),
        },
        _ => None,
    }
}

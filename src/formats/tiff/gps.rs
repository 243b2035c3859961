//! GPS directory decoding

use std::fmt;

use serde::Serialize;

use super::ifd::TiffDirectory;
use super::tags;
use crate::error::{Error, Result};
use crate::types::RationalNumber;

/// A coordinate in degrees, minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    /// Builds a coordinate from exactly three rationals
    pub fn from_rationals(name: &str, values: &[RationalNumber]) -> Result<Self> {
        match values {
            [degrees, minutes, seconds] => Ok(Self {
                degrees: degrees.value(),
                minutes: minutes.value(),
                seconds: seconds.value(),
            }),
            _ => Err(Error::InvalidFormat(format!(
                "{}: expected 3 rational values, found {}",
                name,
                values.len()
            ))),
        }
    }

    pub fn to_degrees(&self) -> f64 {
        self.degrees + self.minutes / 60.0 + self.seconds / 3600.0
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}° {}' {}\"", self.degrees, self.minutes, self.seconds)
    }
}

/// Position decoded from a GPS directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsInfo {
    pub latitude_ref: String,
    pub latitude: Dms,
    pub longitude_ref: String,
    pub longitude: Dms,
    /// Metres relative to sea level
    pub altitude: Option<f64>,
}

impl GpsInfo {
    /// Decodes latitude, longitude and altitude of a GPS directory
    pub fn from_directory(dir: &TiffDirectory) -> Result<Self> {
        let latitude_ref = ref_value(dir, tags::GPS_LATITUDE_REF, &["N", "S"])?;
        let latitude = dms_value(dir, tags::GPS_LATITUDE, "GPSLatitude")?;
        let longitude_ref = ref_value(dir, tags::GPS_LONGITUDE_REF, &["E", "W"])?;
        let longitude = dms_value(dir, tags::GPS_LONGITUDE, "GPSLongitude")?;

        let altitude = match dir.field_value(tags::GPS_ALTITUDE)? {
            Some(value) => {
                let metres = value.as_number().ok_or_else(|| {
                    Error::InvalidFormat("GPSAltitude: expected a single rational".to_string())
                })?;
                let below_sea_level = dir.int_or(tags::GPS_ALTITUDE_REF, 0)? == 1;
                Some(if below_sea_level { -metres } else { metres })
            }
            None => None,
        };

        Ok(Self {
            latitude_ref,
            latitude,
            longitude_ref,
            longitude,
            altitude,
        })
    }

    /// Signed decimal latitude, negative in the southern hemisphere
    pub fn latitude_degrees(&self) -> f64 {
        let degrees = self.latitude.to_degrees();
        if self.latitude_ref == "S" {
            -degrees
        } else {
            degrees
        }
    }

    /// Signed decimal longitude, negative west of Greenwich
    pub fn longitude_degrees(&self) -> f64 {
        let degrees = self.longitude.to_degrees();
        if self.longitude_ref == "W" {
            -degrees
        } else {
            degrees
        }
    }
}

fn ref_value(dir: &TiffDirectory, tag: u16, valid: &[&str]) -> Result<String> {
    let value = dir.field_value(tag)?.ok_or(Error::MissingTag(tag))?;
    let text = value.as_string().unwrap_or_default().trim().to_uppercase();
    if !valid.contains(&text.as_str()) {
        return Err(Error::InvalidFormat(format!(
            "{}: unexpected reference '{}'",
            tags::tag_name(dir.kind, tag),
            text
        )));
    }
    Ok(text)
}

fn dms_value(dir: &TiffDirectory, tag: u16, name: &str) -> Result<Dms> {
    let value = dir.field_value(tag)?.ok_or(Error::MissingTag(tag))?;
    let rationals = value
        .as_rationals()
        .ok_or_else(|| Error::InvalidFormat(format!("{}: expected rational values", name)))?;
    Dms::from_rationals(name, rationals)
}

impl fmt::Display for GpsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GPS Information:")?;
        writeln!(f, "  Latitude: {} {} ({:.6})", self.latitude, self.latitude_ref, self.latitude_degrees())?;
        writeln!(f, "  Longitude: {} {} ({:.6})", self.longitude, self.longitude_ref, self.longitude_degrees())?;
        if let Some(altitude) = self.altitude {
            writeln!(f, "  Altitude: {} m", altitude)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::field_type::FieldType;
    use crate::formats::tiff::ifd::{DirectoryKind, TiffField};
    use crate::io::ByteOrder;

    const ORDER: ByteOrder = ByteOrder::BigEndian;

    fn ascii(tag: u16, text: &[u8]) -> TiffField {
        TiffField::inline(tag, DirectoryKind::Gps, FieldType::Ascii, text.len() as u32, text, ORDER).unwrap()
    }

    fn rationals(tag: u16, values: &[(i32, i32)]) -> TiffField {
        let values: Vec<RationalNumber> = values.iter().map(|&(n, d)| RationalNumber::new(n, d)).collect();
        TiffField::new(
            tag,
            DirectoryKind::Gps,
            FieldType::Rational.code(),
            values.len() as u32,
            ORDER.encode_u32(200),
            ORDER.encode_rational_array(&values),
            ORDER,
        )
    }

    fn gps_directory(latitude: &[(i32, i32)]) -> TiffDirectory {
        let mut dir = TiffDirectory::new(DirectoryKind::Gps, 100, ORDER);
        dir.add_field(ascii(tags::GPS_LATITUDE_REF, b"S\0"));
        dir.add_field(rationals(tags::GPS_LATITUDE, latitude));
        dir.add_field(ascii(tags::GPS_LONGITUDE_REF, b"E\0"));
        dir.add_field(rationals(tags::GPS_LONGITUDE, &[(151, 1), (12, 1), (36, 1)]));
        dir
    }

    #[test]
    fn test_decode_position() {
        let mut dir = gps_directory(&[(33, 1), (52, 1), (1800, 100)]);
        dir.add_field(TiffField::inline(tags::GPS_ALTITUDE_REF, DirectoryKind::Gps, FieldType::Byte, 1, &[1], ORDER).unwrap());
        dir.add_field(rationals(tags::GPS_ALTITUDE, &[(25, 2)]));

        let gps = GpsInfo::from_directory(&dir).unwrap();
        assert_eq!(gps.latitude_ref, "S");
        assert!((gps.latitude_degrees() - -(33.0 + 52.0 / 60.0 + 18.0 / 3600.0)).abs() < 1e-9);
        assert!((gps.longitude_degrees() - (151.0 + 12.0 / 60.0 + 36.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(gps.altitude, Some(-12.5));
    }

    #[test]
    fn test_requires_three_rationals() {
        let dir = gps_directory(&[(33, 1), (52, 1)]);
        assert!(matches!(GpsInfo::from_directory(&dir), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_reference() {
        let mut dir = gps_directory(&[(33, 1), (52, 1), (0, 1)]);
        dir.remove_field(tags::GPS_LONGITUDE_REF);
        assert!(matches!(
            GpsInfo::from_directory(&dir),
            Err(Error::MissingTag(tags::GPS_LONGITUDE_REF))
        ));
    }

    #[test]
    fn test_invalid_reference() {
        let mut dir = gps_directory(&[(33, 1), (52, 1), (0, 1)]);
        dir.remove_field(tags::GPS_LATITUDE_REF);
        dir.add_field(ascii(tags::GPS_LATITUDE_REF, b"X\0"));
        assert!(GpsInfo::from_directory(&dir).is_err());
    }
}

//! Adapter from raw EXIF GPS tags to [`Waypoint`]s.
//!
//! Byte-level EXIF parsing is left to an external [`MetadataExtractor`]. It
//! hands back a [`GpsTags`] with the handful of fields this crate needs, and
//! [`GpsTags::to_waypoint`] turns those into the stable waypoint shape right
//! at the boundary. Nothing downstream sees EXIF naming conventions.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PhotoRouteError, Result};
use crate::geo_utils::dms_to_decimal;
use crate::normalize::parse_timestamp;
use crate::{RawTimestamp, Waypoint};

/// An unsigned EXIF RATIONAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }
}

impl From<u32> for Rational {
    fn from(value: u32) -> Self {
        Self::new(value, 1)
    }
}

/// The GPS-related tags of one image, as reported by an EXIF reader.
///
/// Field names follow the EXIF tags they come from: `GPSLatitude`,
/// `GPSLatitudeRef`, `GPSLongitude`, `GPSLongitudeRef`, `GPSAltitude`,
/// `GPSAltitudeRef` and `DateTime`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsTags {
    /// Degrees, minutes, seconds
    pub latitude: Option<[Rational; 3]>,
    /// `N` or `S`, north when absent
    pub latitude_ref: Option<char>,
    pub longitude: Option<[Rational; 3]>,
    /// `E` or `W`, east when absent
    pub longitude_ref: Option<char>,
    pub altitude: Option<Rational>,
    /// 0 above sea level, 1 below
    pub altitude_ref: Option<u8>,
    /// `YYYY:MM:DD HH:MM:SS`
    pub date_time: Option<String>,
}

/// Something that can read GPS tags out of an encoded image.
///
/// Implementations return `Ok(None)` for images that simply have no GPS
/// block and `Err` when the bytes could not be read at all.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Option<GpsTags>>;
}

impl<F> MetadataExtractor for F
where
    F: Fn(&str, &[u8]) -> Result<Option<GpsTags>> + Send + Sync,
{
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<Option<GpsTags>> {
        self(name, bytes)
    }
}

fn dms_triple(value: &[Rational; 3], hemisphere: char, field: &'static str) -> Result<f64> {
    let [d, m, s] = value;
    match (d.to_f64(), m.to_f64(), s.to_f64()) {
        (Some(d), Some(m), Some(s)) => Ok(dms_to_decimal(d, m, s, hemisphere)),
        _ => Err(PhotoRouteError::InvalidRational { field }),
    }
}

/// Parse an EXIF `DateTime` value (`YYYY:MM:DD HH:MM:SS`) as UTC.
///
/// EXIF strings are often NUL padded; padding is ignored. Other common
/// layouts are accepted as a fallback.
pub fn parse_exif_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(value, "%Y:%m:%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| parse_timestamp(&RawTimestamp::Text(value.to_string())))
}

impl GpsTags {
    /// Convert the tags into a waypoint named `name`.
    ///
    /// Fails when latitude or longitude is missing or unreadable. A bad
    /// altitude or date is logged and left out instead.
    ///
    /// ```rust
    /// use photo_route::{GpsTags, Rational};
    ///
    /// let tags = GpsTags {
    ///     latitude: Some([Rational::new(40, 1), Rational::new(26, 1), Rational::new(46, 1)]),
    ///     latitude_ref: Some('N'),
    ///     longitude: Some([Rational::new(79, 1), Rational::new(58, 1), Rational::new(5600, 100)]),
    ///     longitude_ref: Some('W'),
    ///     altitude: Some(Rational::new(3005, 10)),
    ///     altitude_ref: Some(0),
    ///     date_time: Some("2023:07:14 09:30:00".into()),
    /// };
    ///
    /// let wp = tags.to_waypoint("IMG_0001.jpg").unwrap();
    /// assert!((wp.latitude - 40.446111).abs() < 1e-4);
    /// assert!((wp.longitude + 79.982222).abs() < 1e-4);
    /// assert_eq!(wp.altitude, Some(300.5));
    /// assert!(wp.timestamp.is_some());
    /// ```
    pub fn to_waypoint(&self, name: &str) -> Result<Waypoint> {
        let (Some(lat), Some(lon)) = (&self.latitude, &self.longitude) else {
            return Err(PhotoRouteError::MissingGps { name: name.to_string() });
        };

        let lat_ref = self.latitude_ref.unwrap_or('N').to_ascii_uppercase();
        let lon_ref = self.longitude_ref.unwrap_or('E').to_ascii_uppercase();
        let latitude = dms_triple(lat, lat_ref, "GPSLatitude")?;
        let longitude = dms_triple(lon, lon_ref, "GPSLongitude")?;

        let altitude = self.altitude.and_then(|alt| {
            let value = alt.to_f64();
            if value.is_none() {
                warn!("[Exif] '{}': unreadable GPSAltitude {:?}", name, alt);
            }
            value.map(|v| if self.altitude_ref == Some(1) { -v } else { v })
        });

        let timestamp = self.date_time.as_deref().and_then(|dt| {
            let parsed = parse_exif_datetime(dt);
            if parsed.is_none() {
                warn!("[Exif] '{}': unparsable DateTime {:?}", name, dt);
            }
            parsed
        });

        Ok(Waypoint {
            name: name.to_string(),
            latitude,
            longitude,
            altitude,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tags() -> GpsTags {
        GpsTags {
            latitude: Some([Rational::new(51, 1), Rational::new(30, 1), Rational::new(2664, 100)]),
            latitude_ref: Some('N'),
            longitude: Some([Rational::new(0, 1), Rational::new(7, 1), Rational::new(4008, 100)]),
            longitude_ref: Some('W'),
            altitude: Some(Rational::new(35, 1)),
            altitude_ref: None,
            date_time: Some("2024:05:01 10:00:00".to_string()),
        }
    }

    #[test]
    fn test_rational() {
        assert_eq!(Rational::new(3, 2).to_f64(), Some(1.5));
        assert_eq!(Rational::new(3, 0).to_f64(), None);
    }

    #[test]
    fn test_full_tags() {
        let wp = tags().to_waypoint("london.jpg").unwrap();
        assert_eq!(wp.name, "london.jpg");
        assert!((wp.latitude - 51.5074).abs() < 1e-4);
        assert!((wp.longitude + 0.1278).abs() < 1e-4);
        assert_eq!(wp.altitude, Some(35.0));
        assert_eq!(wp.timestamp, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_missing_coordinates() {
        let mut t = tags();
        t.longitude = None;
        assert!(matches!(t.to_waypoint("x.jpg"), Err(PhotoRouteError::MissingGps { .. })));
    }

    #[test]
    fn test_zero_denominator_coordinate() {
        let mut t = tags();
        t.latitude = Some([Rational::new(51, 1), Rational::new(30, 0), Rational::new(0, 1)]);
        assert!(matches!(
            t.to_waypoint("x.jpg"),
            Err(PhotoRouteError::InvalidRational { field: "GPSLatitude" })
        ));
    }

    #[test]
    fn test_refs_default_and_lowercase() {
        let mut t = tags();
        t.latitude_ref = Some('s');
        t.longitude_ref = None;
        let wp = t.to_waypoint("x.jpg").unwrap();
        assert!(wp.latitude < 0.0);
        assert!(wp.longitude > 0.0);
    }

    #[test]
    fn test_altitude_below_sea_level() {
        let mut t = tags();
        t.altitude = Some(Rational::new(28, 1));
        t.altitude_ref = Some(1);
        assert_eq!(t.to_waypoint("x.jpg").unwrap().altitude, Some(-28.0));
    }

    #[test]
    fn test_bad_altitude_and_date_are_dropped() {
        let mut t = tags();
        t.altitude = Some(Rational::new(10, 0));
        t.date_time = Some("    :  :     :  :  ".to_string());
        let wp = t.to_waypoint("x.jpg").unwrap();
        assert_eq!(wp.altitude, None);
        assert_eq!(wp.timestamp, None);
    }

    #[test]
    fn test_parse_exif_datetime_padding() {
        let ts = parse_exif_datetime("2024:05:01 10:00:00\0").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        assert!(parse_exif_datetime("").is_none());
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |name: &str, bytes: &[u8]| -> Result<Option<GpsTags>> {
            if bytes.is_empty() {
                Err(PhotoRouteError::Extraction {
                    name: name.to_string(),
                    message: "empty file".to_string(),
                })
            } else {
                Ok(Some(tags()))
            }
        };
        assert!(extractor.extract("a.jpg", b"jpeg").unwrap().is_some());
        assert!(extractor.extract("b.jpg", b"").is_err());
    }
}

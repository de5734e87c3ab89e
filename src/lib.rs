//! # Photo Route
//!
//! Route derivation and statistics for collections of geotagged photographs.
//!
//! This library provides:
//! - Waypoint normalization (timestamp parsing, coordinate validation, time ordering)
//! - Route statistics robust to GPS jumps and clock skew
//! - Elevation and speed profiles for charting
//! - A dwell-weighted heatmap grid
//! - An adapter from raw EXIF GPS tags to waypoints, with parallel extraction
//! - GPX export
//!
//! ## Features
//!
//! - **`parallel`** - Extract metadata from many images with rayon
//! - **`async`** - Bounded async extraction fan-out on tokio
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`cli`** - Build the `photo-route` command line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use photo_route::{RawWaypoint, analyze_waypoints};
//!
//! let raw = vec![
//!     RawWaypoint::new("IMG_0001.jpg", 0.0, 0.0).with_timestamp_text("2024-05-01T10:00:00Z"),
//!     RawWaypoint::new("IMG_0002.jpg", 0.0, 0.01).with_timestamp_text("2024-05-01T10:01:00Z"),
//! ];
//!
//! let analysis = analyze_waypoints(&raw);
//! let stats = analysis.statistics.expect("two valid waypoints");
//! assert!((stats.total_distance_km - 1.112).abs() < 0.01);
//! ```

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{PhotoRouteError, Result};

// Coordinate and distance primitives
pub mod geo_utils;
pub use geo_utils::{
    compute_bounds, dms_to_decimal, format_coordinates, haversine_distance_km,
    is_valid_coordinate, spherical_centroid, EARTH_RADIUS_KM,
};

// Waypoint cleaning and ordering
pub mod normalize;
pub use normalize::{normalize_waypoints, parse_timestamp, raw_waypoints_from_json};

// Route statistics and profiles
pub mod statistics;
pub use statistics::{
    compute_route_statistics, format_duration, ElevationPoint, RouteStatistics, SpeedPoint,
    MAX_SEGMENT_DISTANCE_KM, MAX_SEGMENT_SPEED_KMH,
};

// Heatmap generation module
pub mod heatmap;
pub use heatmap::{build_heatmap_grid, HeatmapCell, HeatmapResult};

// EXIF tag adapter
pub mod exif;
pub use exif::{parse_exif_datetime, GpsTags, MetadataExtractor, Rational};

// Extraction fan-out over image buffers
pub mod extract;
pub use extract::{extract_waypoints, ImageSource};

#[cfg(feature = "async")]
pub use extract::{extract_waypoints_async, ExtractConfig, ProgressCallback};

// GPX export
pub mod gpx;
pub use gpx::{to_gpx_string, write_gpx};

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("PhotoRouteRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A timestamp as it arrives from upstream: an already-parsed instant, a
/// textual date, or Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Instant(DateTime<Utc>),
    UnixMillis(i64),
    Text(String),
}

/// A waypoint record before normalization.
///
/// This is the input contract of the library: coordinates may be out of range,
/// the altitude may be missing and the timestamp may be unparsable.
///
/// Deserialization never fails on a bad field value. An unusable coordinate
/// becomes NaN (the record is dropped during normalization), an unusable
/// altitude or timestamp becomes `None`. Numeric strings are accepted for
/// coordinates and altitude; fractional epoch milliseconds are rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWaypoint {
    #[serde(default, deserialize_with = "normalize::lenient_name")]
    pub name: String,
    #[serde(default = "normalize::missing_coordinate", deserialize_with = "normalize::lenient_coordinate")]
    pub latitude: f64,
    #[serde(default = "normalize::missing_coordinate", deserialize_with = "normalize::lenient_coordinate")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "normalize::lenient_altitude")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "normalize::lenient_timestamp")]
    pub timestamp: Option<RawTimestamp>,
}

impl RawWaypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            altitude: None,
            timestamp: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(RawTimestamp::Instant(timestamp));
        self
    }

    pub fn with_timestamp_text(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(RawTimestamp::Text(timestamp.into()));
        self
    }
}

/// A single geotagged location sample derived from one photo.
///
/// Waypoints are built once at ingestion and only read afterwards.
///
/// # Example
/// ```
/// use photo_route::Waypoint;
/// let wp = Waypoint::new("IMG_0042.jpg", 51.5074, -0.1278).with_altitude(35.0);
/// assert!(wp.is_valid());
/// assert_eq!(wp.elevation(), 35.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Source identifier, usually the image file name
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level, `None` when the source had no altitude
    pub altitude: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            altitude: None,
            timestamp: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Check if the waypoint has valid coordinates.
    pub fn is_valid(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }

    /// Altitude in meters, 0 when unknown.
    pub fn elevation(&self) -> f64 {
        self.altitude.unwrap_or(0.0)
    }
}

/// Bounding box of a set of waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Everything derived from one waypoint collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAnalysis {
    /// Valid waypoints in route order
    pub waypoints: Vec<Waypoint>,
    /// `None` when fewer than 2 valid waypoints remain
    pub statistics: Option<RouteStatistics>,
    pub heatmap: HeatmapResult,
    /// Spherical centroid of the route, for initial map placement
    pub center: LatLng,
    pub bounds: Option<Bounds>,
}

// ============================================================================
// Core Functions
// ============================================================================

/// Run the full pipeline over raw records: normalize, compute statistics,
/// build the heatmap and locate the route.
///
/// This is a pure function of its input. Recompute it whenever the waypoint
/// collection changes; nothing is carried over between calls.
pub fn analyze_waypoints(raw: &[RawWaypoint]) -> RouteAnalysis {
    let waypoints = normalize_waypoints(raw);
    let statistics = compute_route_statistics(&waypoints);
    let heatmap = build_heatmap_grid(&waypoints);
    let center = spherical_centroid(&waypoints);
    let bounds = compute_bounds(&waypoints);

    info!(
        "[PhotoRoute] analyzed {} raw records -> {} waypoints, {} heatmap cells",
        raw.len(),
        waypoints.len(),
        heatmap.cells.len()
    );

    RouteAnalysis {
        waypoints,
        statistics,
        heatmap,
        center,
        bounds,
    }
}

// ============================================================================
// Tests
// ============================================================================

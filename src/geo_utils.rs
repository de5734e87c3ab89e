//! # Geographic Utilities
//!
//! Coordinate and distance primitives used throughout the route pipeline.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`dms_to_decimal`] | Degrees/minutes/seconds to signed decimal degrees |
//! | [`haversine_distance_km`] | Great-circle distance between two coordinates |
//! | [`is_valid_coordinate`] | Range and finiteness check for a lat/lon pair |
//! | [`spherical_centroid`] | Mean position of waypoints on the unit sphere |
//! | [`compute_bounds`] | Bounding box of a set of waypoints |
//! | [`format_coordinates`] | Human readable `12.345678° N, 1.234567° W` |
//!
//! ## Example
//!
//! ```rust
//! use photo_route::geo_utils;
//!
//! let lat = geo_utils::dms_to_decimal(40.0, 26.0, 46.0, 'N');
//! let lon = geo_utils::dms_to_decimal(79.0, 58.0, 56.0, 'W');
//! assert!((lat - 40.446111).abs() < 1e-4);
//! assert!(lon < 0.0);
//!
//! let km = geo_utils::haversine_distance_km(lat, lon, 40.4406, -79.9959);
//! println!("{:.2} km to downtown", km);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances assume a spherical Earth of radius [`EARTH_RADIUS_KM`]. For photo
//! spacing (meters to a few kilometers) the error against the ellipsoid is
//! well below GPS noise.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees), which is the
//! standard used by GPS receivers and EXIF GPS tags.

use geo::{BoundingRect, MultiPoint, Point};
use log::warn;

use crate::{Bounds, LatLng, Waypoint};

/// Mean Earth radius used by [`haversine_distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Conversion Functions
// =============================================================================

/// Convert degrees/minutes/seconds to decimal degrees.
///
/// The result is negated for the southern (`S`) and western (`W`) hemispheres.
/// Any other reference, including lowercase letters, is treated as north/east.
///
/// ```rust
/// use photo_route::dms_to_decimal;
///
/// assert!((dms_to_decimal(40.0, 26.0, 46.0, 'N') - 40.446111).abs() < 1e-4);
/// assert!((dms_to_decimal(40.0, 26.0, 46.0, 'S') + 40.446111).abs() < 1e-4);
/// ```
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere {
        'S' | 'W' => -decimal,
        _ => decimal,
    }
}

/// Format a coordinate pair with hemisphere letters instead of signs.
pub fn format_coordinates(latitude: f64, longitude: f64, decimals: usize) -> String {
    let lat_dir = if latitude >= 0.0 { 'N' } else { 'S' };
    let lng_dir = if longitude >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.*}° {}, {:.*}° {}",
        decimals,
        latitude.abs(),
        lat_dir,
        decimals,
        longitude.abs(),
        lng_dir
    )
}

// =============================================================================
// Validation
// =============================================================================

/// Check that both values are finite and within latitude [-90, 90] and
/// longitude [-180, 180]. Boundaries are inclusive.
#[inline]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two coordinates in kilometers.
///
/// Invalid coordinates do not fail the call: a warning is logged and 0.0 is
/// returned so that running totals stay defined.
///
/// # Example
///
/// ```rust
/// use photo_route::haversine_distance_km;
///
/// // London to Paris is roughly 344 km
/// let d = haversine_distance_km(51.5074, -0.1278, 48.8566, 2.3522);
/// assert!((d - 343.5).abs() < 1.0);
/// ```
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if !is_valid_coordinate(lat1, lon1) || !is_valid_coordinate(lat2, lon2) {
        warn!(
            "[GeoUtils] invalid coordinates for distance: ({}, {}) -> ({}, {})",
            lat1, lon1, lat2, lon2
        );
        return 0.0;
    }

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two waypoints in kilometers.
#[inline]
pub fn waypoint_distance_km(a: &Waypoint, b: &Waypoint) -> f64 {
    haversine_distance_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Compute the geographic centroid of a set of waypoints.
///
/// Each point is projected to a unit vector, the vectors are averaged and the
/// mean is projected back to latitude/longitude. Unlike plain coordinate
/// averaging this behaves across the antimeridian.
///
/// Returns (0, 0) for empty input. Invalid points are ignored.
///
/// # Example
///
/// ```rust
/// use photo_route::{Waypoint, spherical_centroid};
///
/// let points = vec![
///     Waypoint::new("a", 0.0, 179.0),
///     Waypoint::new("b", 0.0, -179.0),
/// ];
/// let center = spherical_centroid(&points);
/// assert!((center.longitude.abs() - 180.0).abs() < 1e-6);
/// ```
pub fn spherical_centroid(points: &[Waypoint]) -> LatLng {
    let valid: Vec<&Waypoint> = points.iter().filter(|p| p.is_valid()).collect();

    match valid.as_slice() {
        [] => return LatLng::new(0.0, 0.0),
        [only] => return LatLng::new(only.latitude, only.longitude),
        _ => {}
    }

    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for p in &valid {
        let lat = p.latitude.to_radians();
        let lon = p.longitude.to_radians();
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }

    let n = valid.len() as f64;
    x /= n;
    y /= n;
    z /= n;

    let lon = y.atan2(x);
    let hyp = (x * x + y * y).sqrt();
    let lat = z.atan2(hyp);

    LatLng::new(lat.to_degrees(), lon.to_degrees())
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of the valid waypoints, or `None` if there are none.
pub fn compute_bounds(points: &[Waypoint]) -> Option<Bounds> {
    let multi: MultiPoint<f64> = points
        .iter()
        .filter(|p| p.is_valid())
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect();

    multi.bounding_rect().map(|rect| Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_valid_coordinate_boundaries() {
        assert!(is_valid_coordinate(90.0, 180.0));
        assert!(is_valid_coordinate(-90.0, -180.0));
        assert!(is_valid_coordinate(0.0, 0.0));
        assert!(!is_valid_coordinate(90.0001, 0.0));
        assert!(!is_valid_coordinate(-90.0001, 0.0));
        assert!(!is_valid_coordinate(0.0, 180.0001));
        assert!(!is_valid_coordinate(0.0, -180.0001));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
    }

    #[test]
    fn test_dms_reference_value() {
        let lat = dms_to_decimal(40.0, 26.0, 46.0, 'N');
        assert!(approx_eq(lat, 40.446111, 1e-4));
        assert!(approx_eq(dms_to_decimal(40.0, 26.0, 46.0, 'S'), -lat, 1e-12));
        assert!(approx_eq(dms_to_decimal(79.0, 58.0, 56.0, 'W'), -79.982222, 1e-4));
        assert!(approx_eq(dms_to_decimal(79.0, 58.0, 56.0, 'E'), 79.982222, 1e-4));
    }

    #[test]
    fn test_haversine_distance_same_point() {
        assert_eq!(haversine_distance_km(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
    }

    #[test]
    fn test_haversine_symmetry() {
        let ab = haversine_distance_km(51.5074, -0.1278, 48.8566, 2.3522);
        let ba = haversine_distance_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!(approx_eq(ab, ba, 1e-9));
    }

    #[test]
    fn test_haversine_known_value() {
        // 0.01 degree of longitude on the equator
        let d = haversine_distance_km(0.0, 0.0, 0.0, 0.01);
        assert!(approx_eq(d, 1.11195, 1e-4));
    }

    #[test]
    fn test_haversine_agrees_with_geo() {
        let ours = haversine_distance_km(51.5074, -0.1278, 48.8566, 2.3522);
        let theirs = Haversine::distance(Point::new(-0.1278, 51.5074), Point::new(2.3522, 48.8566)) / 1000.0;
        // geo uses a slightly larger mean radius
        assert!(approx_eq(ours, theirs, 0.5));
    }

    #[test]
    fn test_haversine_invalid_returns_zero() {
        assert_eq!(haversine_distance_km(95.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(haversine_distance_km(0.0, 0.0, f64::NAN, 0.0), 0.0);
    }

    #[test]
    fn test_centroid_empty() {
        assert_eq!(spherical_centroid(&[]), LatLng::new(0.0, 0.0));
    }

    #[test]
    fn test_centroid_single_point() {
        let c = spherical_centroid(&[Waypoint::new("a", 12.5, -45.25)]);
        assert_eq!(c, LatLng::new(12.5, -45.25));
    }

    #[test]
    fn test_centroid_two_points() {
        let c = spherical_centroid(&[
            Waypoint::new("a", 51.50, -0.10),
            Waypoint::new("b", 51.52, -0.12),
        ]);
        assert!(approx_eq(c.latitude, 51.51, 0.001));
        assert!(approx_eq(c.longitude, -0.11, 0.001));
    }

    #[test]
    fn test_centroid_nearly_antipodal() {
        let a = Waypoint::new("a", 10.0, 20.0);
        let b = Waypoint::new("b", -9.0, -161.0);
        let c = spherical_centroid(&[a.clone(), b.clone()]);
        assert!(c.latitude.is_finite() && c.longitude.is_finite());
        assert_ne!(c, LatLng::new(a.latitude, a.longitude));
        assert_ne!(c, LatLng::new(b.latitude, b.longitude));
    }

    #[test]
    fn test_compute_bounds() {
        let points = vec![
            Waypoint::new("a", 51.50, -0.13),
            Waypoint::new("b", 51.51, -0.12),
            Waypoint::new("c", 51.505, -0.125),
            Waypoint::new("bad", 200.0, 0.0),
        ];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min_lat, 51.50);
        assert_eq!(bounds.max_lat, 51.51);
        assert_eq!(bounds.min_lng, -0.13);
        assert_eq!(bounds.max_lng, -0.12);
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }

    #[test]
    fn test_format_coordinates() {
        assert_eq!(format_coordinates(40.446111, -79.982222, 6), "40.446111° N, 79.982222° W");
        assert_eq!(format_coordinates(-33.8688, 151.2093, 2), "33.87° S, 151.21° E");
    }
}

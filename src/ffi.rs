//! UniFFI bindings for iOS/Android.
//!
//! Timestamps cross the boundary as Unix epoch milliseconds. Everything else
//! maps onto the core types directly.

use log::{debug, info, warn};

use crate::statistics::{ElevationPoint, SpeedPoint};
use crate::{
    analyze_waypoints, build_heatmap_grid, compute_bounds, compute_route_statistics,
    format_coordinates, format_duration, init_logging, normalize_waypoints,
    raw_waypoints_from_json, spherical_centroid, to_gpx_string, Bounds, HeatmapResult, LatLng,
    RawTimestamp, RawWaypoint, RouteStatistics, Waypoint, MAX_SEGMENT_DISTANCE_KM,
    MAX_SEGMENT_SPEED_KMH,
};

// ========================================================================
// FFI Types
// ========================================================================

/// A waypoint as passed from Kotlin/Swift.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiWaypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Unix epoch milliseconds
    pub timestamp_ms: Option<i64>,
}

impl From<FfiWaypoint> for RawWaypoint {
    fn from(wp: FfiWaypoint) -> Self {
        RawWaypoint {
            name: wp.name,
            latitude: wp.latitude,
            longitude: wp.longitude,
            altitude: wp.altitude,
            timestamp: wp.timestamp_ms.map(RawTimestamp::UnixMillis),
        }
    }
}

impl From<Waypoint> for FfiWaypoint {
    fn from(wp: Waypoint) -> Self {
        FfiWaypoint {
            name: wp.name,
            latitude: wp.latitude,
            longitude: wp.longitude,
            altitude: wp.altitude,
            timestamp_ms: wp.timestamp.map(|ts| ts.timestamp_millis()),
        }
    }
}

/// Route statistics with timestamps as Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiRouteStatistics {
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
    pub start_time_ms: Option<i64>,
    pub end_time_ms: Option<i64>,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub elevation_gain_m: f64,
    pub photo_count: u32,
    pub elevation_profile: Vec<ElevationPoint>,
    pub speed_profile: Vec<SpeedPoint>,
    /// Human-readable duration (HH:MM:SS)
    pub duration_label: String,
}

impl From<RouteStatistics> for FfiRouteStatistics {
    fn from(stats: RouteStatistics) -> Self {
        FfiRouteStatistics {
            duration_label: format_duration(stats.total_duration_seconds),
            total_distance_km: stats.total_distance_km,
            total_duration_seconds: stats.total_duration_seconds,
            start_time_ms: stats.start_time.map(|ts| ts.timestamp_millis()),
            end_time_ms: stats.end_time.map(|ts| ts.timestamp_millis()),
            avg_speed_kmh: stats.avg_speed_kmh,
            max_speed_kmh: stats.max_speed_kmh,
            min_elevation_m: stats.min_elevation_m,
            max_elevation_m: stats.max_elevation_m,
            elevation_gain_m: stats.elevation_gain_m,
            photo_count: stats.photo_count,
            elevation_profile: stats.elevation_profile,
            speed_profile: stats.speed_profile,
        }
    }
}

/// Fixed noise-rejection thresholds, for display in settings screens.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct StatisticsThresholds {
    pub max_segment_distance_km: f64,
    pub max_segment_speed_kmh: f64,
}

fn normalize(waypoints: Vec<FfiWaypoint>) -> Vec<Waypoint> {
    let raw: Vec<RawWaypoint> = waypoints.into_iter().map(RawWaypoint::from).collect();
    normalize_waypoints(&raw)
}

// ========================================================================
// Exports
// ========================================================================

/// Validate and time-order waypoints.
#[uniffi::export]
pub fn ffi_normalize_waypoints(waypoints: Vec<FfiWaypoint>) -> Vec<FfiWaypoint> {
    init_logging();
    let input = waypoints.len();
    let normalized: Vec<FfiWaypoint> = normalize(waypoints).into_iter().map(FfiWaypoint::from).collect();
    debug!("[PhotoRouteRust] normalized {} -> {} waypoints", input, normalized.len());
    normalized
}

/// Normalize the waypoints and compute route statistics.
///
/// Returns `None` when fewer than two valid waypoints remain.
#[uniffi::export]
pub fn ffi_compute_route_statistics(waypoints: Vec<FfiWaypoint>) -> Option<FfiRouteStatistics> {
    init_logging();
    info!("[PhotoRouteRust] 🦀 compute_route_statistics called with {} waypoints", waypoints.len());
    let result = compute_route_statistics(&normalize(waypoints)).map(FfiRouteStatistics::from);
    if let Some(ref stats) = result {
        info!(
            "[PhotoRouteRust] 🦀 {} photos, {:.2} km, {}",
            stats.photo_count, stats.total_distance_km, stats.duration_label
        );
    }
    result
}

/// Normalize the waypoints and build the dwell-weighted heatmap.
#[uniffi::export]
pub fn ffi_build_heatmap(waypoints: Vec<FfiWaypoint>) -> HeatmapResult {
    init_logging();
    let result = build_heatmap_grid(&normalize(waypoints));
    info!(
        "[PhotoRouteRust] 🦀 heatmap: {} cells, max intensity {:.2}",
        result.cells.len(),
        result.max_intensity
    );
    result
}

/// Spherical centroid of the waypoints, `(0, 0)` when there are none.
#[uniffi::export]
pub fn ffi_route_center(waypoints: Vec<FfiWaypoint>) -> LatLng {
    init_logging();
    spherical_centroid(&normalize(waypoints))
}

#[uniffi::export]
pub fn ffi_route_bounds(waypoints: Vec<FfiWaypoint>) -> Option<Bounds> {
    init_logging();
    compute_bounds(&normalize(waypoints))
}

/// Render the normalized route as a GPX 1.1 document.
#[uniffi::export]
pub fn ffi_export_gpx(waypoints: Vec<FfiWaypoint>) -> Option<String> {
    init_logging();
    match to_gpx_string(&normalize(waypoints)) {
        Ok(gpx) => Some(gpx),
        Err(e) => {
            warn!("[PhotoRouteRust] GPX export failed: {}", e);
            None
        }
    }
}

/// Run the whole pipeline on a JSON array of raw waypoints and return the
/// analysis as JSON. Accepts the same timestamp forms as the Rust API.
#[uniffi::export]
pub fn ffi_analyze_json(waypoints_json: String) -> Option<String> {
    init_logging();
    let raw = match raw_waypoints_from_json(&waypoints_json) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("[PhotoRouteRust] invalid waypoint JSON: {}", e);
            return None;
        }
    };
    let analysis = analyze_waypoints(&raw);
    match serde_json::to_string(&analysis) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("[PhotoRouteRust] failed to serialize analysis: {}", e);
            None
        }
    }
}

#[uniffi::export]
pub fn ffi_format_duration(seconds: f64) -> String {
    format_duration(seconds)
}

#[uniffi::export]
pub fn ffi_format_coordinates(latitude: f64, longitude: f64, decimals: u32) -> String {
    format_coordinates(latitude, longitude, decimals as usize)
}

#[uniffi::export]
pub fn default_statistics_thresholds() -> StatisticsThresholds {
    init_logging();
    StatisticsThresholds {
        max_segment_distance_km: MAX_SEGMENT_DISTANCE_KM,
        max_segment_speed_kmh: MAX_SEGMENT_SPEED_KMH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(name: &str, lon: f64, ms: Option<i64>) -> FfiWaypoint {
        FfiWaypoint {
            name: name.to_string(),
            latitude: 0.0,
            longitude: lon,
            altitude: None,
            timestamp_ms: ms,
        }
    }

    #[test]
    fn test_timestamps_cross_as_millis() {
        let out = ffi_normalize_waypoints(vec![
            wp("b", 0.01, Some(1_714_557_660_000)),
            wp("a", 0.0, Some(1_714_557_600_000)),
        ]);
        assert_eq!(out[0].name, "a");
        assert_eq!(out[0].timestamp_ms, Some(1_714_557_600_000));
    }

    #[test]
    fn test_statistics_over_ffi() {
        let stats = ffi_compute_route_statistics(vec![
            wp("a", 0.0, Some(1_714_557_600_000)),
            wp("b", 0.01, Some(1_714_557_660_000)),
        ])
        .unwrap();
        assert_eq!(stats.photo_count, 2);
        assert_eq!(stats.start_time_ms, Some(1_714_557_600_000));
        assert_eq!(stats.duration_label, "00:01:00");
    }

    #[test]
    fn test_analyze_json_rejects_garbage() {
        assert!(ffi_analyze_json("not json".to_string()).is_none());
        let json = ffi_analyze_json(r#"[{"name":"a","latitude":1.0,"longitude":2.0}]"#.to_string()).unwrap();
        assert!(json.contains("\"heatmap\""));

        let json = ffi_analyze_json(
            r#"[{"name":"a","latitude":0.0,"longitude":0.0,"timestamp":1714557600000},
                {"name":"b","latitude":0.0,"longitude":0.01,"timestamp":1714557660000.0,"altitude":"?"},
                {"name":"c","latitude":null,"longitude":0.0}]"#
                .to_string(),
        )
        .unwrap();
        assert!(json.contains("\"photoCount\":2"));
    }
}

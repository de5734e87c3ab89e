//! Route statistics with noise rejection.
//!
//! A single pass over an ordered waypoint sequence accumulates distance,
//! speed and elevation figures, plus the per-index elevation and speed
//! series used for charts.
//!
//! Photo metadata is noisy: a camera without a fix may stamp the last known
//! position from hours ago, and camera clocks drift. Two fixed guards keep
//! such records from dominating the totals:
//!
//! - a segment of [`MAX_SEGMENT_DISTANCE_KM`] or more is discarded entirely
//! - a segment speed of [`MAX_SEGMENT_SPEED_KMH`] or more is not recorded as a
//!   speed, although its distance still counts

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geo_utils::waypoint_distance_km;
use crate::Waypoint;

/// Segments at least this long are treated as GPS errors and skipped.
pub const MAX_SEGMENT_DISTANCE_KM: f64 = 10.0;

/// Segment speeds at least this high are treated as clock errors and skipped.
pub const MAX_SEGMENT_SPEED_KMH: f64 = 300.0;

/// One sample of the elevation profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ElevationPoint {
    /// Position of the waypoint in the route
    pub index: u32,
    pub elevation: f64,
}

/// One sample of the speed profile, attached to the segment's end waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SpeedPoint {
    pub index: u32,
    pub speed: f64,
}

/// Aggregate figures for one route.
///
/// Always derived fresh from a waypoint list; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatistics {
    /// Sum of accepted segment distances
    pub total_distance_km: f64,
    /// Span between the first and last timestamped waypoint, 0 with fewer than two
    pub total_duration_seconds: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Elevation figures cover waypoints with a known altitude, 0 if none had one
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    /// Sum of ascending altitude deltas only
    pub elevation_gain_m: f64,
    pub photo_count: u32,
    pub elevation_profile: Vec<ElevationPoint>,
    pub speed_profile: Vec<SpeedPoint>,
}

/// Compute route statistics over an ordered waypoint sequence.
///
/// The sequence should already be normalized (see
/// [`normalize_waypoints`](crate::normalize_waypoints)); waypoints with
/// invalid coordinates are skipped here as well. Returns `None` when fewer
/// than two valid waypoints remain.
///
/// Segments are taken in the order given, so distance and speed figures only
/// make sense for time-ordered input. Start and end times are the earliest and
/// latest timestamps regardless of order, which keeps the duration
/// non-negative.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use photo_route::{Waypoint, compute_route_statistics};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
/// let route = vec![
///     Waypoint::new("a", 0.0, 0.0).with_timestamp(t0),
///     Waypoint::new("b", 0.0, 0.01).with_timestamp(t0 + chrono::Duration::seconds(60)),
/// ];
///
/// let stats = compute_route_statistics(&route).unwrap();
/// assert!((stats.total_distance_km - 1.112).abs() < 0.001);
/// assert!((stats.avg_speed_kmh - 66.7).abs() < 0.1);
/// ```
pub fn compute_route_statistics(waypoints: &[Waypoint]) -> Option<RouteStatistics> {
    let points: Vec<&Waypoint> = waypoints
        .iter()
        .filter(|w| {
            let ok = w.is_valid();
            if !ok {
                warn!("[RouteStatistics] skipping '{}': invalid coordinates", w.name);
            }
            ok
        })
        .collect();

    if points.len() < 2 {
        debug!("[RouteStatistics] {} valid waypoints, not enough for statistics", points.len());
        return None;
    }

    // Earliest and latest timestamps; on normalized input these are the first
    // and last timed waypoints
    let timed: Vec<DateTime<Utc>> = points.iter().filter_map(|w| w.timestamp).collect();
    let (start_time, end_time, total_duration_seconds) =
        match (timed.len() >= 2, timed.iter().min(), timed.iter().max()) {
            (true, Some(&start), Some(&end)) => (Some(start), Some(end), seconds_between(start, end)),
            _ => (None, None, 0.0),
        };

    let mut total_distance_km = 0.0;
    let mut speeds: Vec<f64> = Vec::new();
    let mut max_speed_kmh: f64 = 0.0;
    let mut min_elevation = f64::INFINITY;
    let mut max_elevation = f64::NEG_INFINITY;
    let mut elevation_gain_m = 0.0;
    let mut elevation_profile = Vec::new();
    let mut speed_profile = Vec::new();

    let mut prev_point: Option<&Waypoint> = None;
    let mut prev_elevation: Option<f64> = None;

    for (i, &point) in points.iter().enumerate() {
        let index = i as u32;

        match point.altitude {
            Some(elevation) if elevation.is_finite() => {
                min_elevation = min_elevation.min(elevation);
                max_elevation = max_elevation.max(elevation);
                if let Some(prev) = prev_elevation {
                    if elevation > prev {
                        elevation_gain_m += elevation - prev;
                    }
                }
                elevation_profile.push(ElevationPoint { index, elevation });
                prev_elevation = Some(elevation);
            }
            Some(elevation) => {
                warn!("[RouteStatistics] '{}': ignoring altitude {}", point.name, elevation);
            }
            None => {}
        }

        if let Some(prev) = prev_point {
            let distance = waypoint_distance_km(prev, point);

            if distance >= MAX_SEGMENT_DISTANCE_KM {
                debug!(
                    "[RouteStatistics] rejecting jump {} -> {}: {:.2} km",
                    prev.name, point.name, distance
                );
            } else {
                total_distance_km += distance;

                if let (Some(t1), Some(t2)) = (prev.timestamp, point.timestamp) {
                    let time_diff = seconds_between(t1, t2);
                    if time_diff > 0.0 {
                        let speed = distance / time_diff * 3600.0;
                        if speed >= MAX_SEGMENT_SPEED_KMH {
                            debug!(
                                "[RouteStatistics] rejecting speed {} -> {}: {:.1} km/h",
                                prev.name, point.name, speed
                            );
                        } else {
                            speeds.push(speed);
                            max_speed_kmh = max_speed_kmh.max(speed);
                            speed_profile.push(SpeedPoint { index, speed });
                        }
                    }
                }
            }
        }

        prev_point = Some(point);
    }

    let avg_speed_kmh = if !speeds.is_empty() {
        speeds.iter().sum::<f64>() / speeds.len() as f64
    } else if total_distance_km > 0.0 && total_duration_seconds > 0.0 {
        total_distance_km / (total_duration_seconds / 3600.0)
    } else {
        0.0
    };

    if elevation_profile.is_empty() {
        min_elevation = 0.0;
        max_elevation = 0.0;
    }

    Some(RouteStatistics {
        total_distance_km,
        total_duration_seconds,
        start_time,
        end_time,
        avg_speed_kmh,
        max_speed_kmh,
        min_elevation_m: min_elevation,
        max_elevation_m: max_elevation,
        elevation_gain_m,
        photo_count: points.len() as u32,
        elevation_profile,
        speed_profile,
    })
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}

/// Format a duration in seconds as `HH:MM:SS`. Hours are not wrapped at 24.
///
/// Negative or non-finite input renders as `-`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "-".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

impl RouteStatistics {
    /// Plain text summary suitable for saving next to an exported route.
    pub fn report(&self) -> String {
        [
            "Route Statistics Report".to_string(),
            "=======================".to_string(),
            String::new(),
            format!("Photos: {}", self.photo_count),
            format!("Distance: {:.2} km", self.total_distance_km),
            format!("Duration: {}", format_duration(self.total_duration_seconds)),
            String::new(),
            format!("Start: {}", format_time(self.start_time)),
            format!("End: {}", format_time(self.end_time)),
            String::new(),
            "Speed:".to_string(),
            format!("- Average: {:.2} km/h", self.avg_speed_kmh),
            format!("- Maximum: {:.2} km/h", self.max_speed_kmh),
            String::new(),
            "Elevation:".to_string(),
            format!("- Minimum: {:.1} m", self.min_elevation_m),
            format!("- Maximum: {:.1} m", self.max_elevation_m),
            format!("- Gain: {:.1} m", self.elevation_gain_m),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn wp(name: &str, lat: f64, lon: f64, secs: i64) -> Waypoint {
        Waypoint::new(name, lat, lon).with_timestamp(t(secs))
    }

    #[test]
    fn test_fewer_than_two_waypoints() {
        assert!(compute_route_statistics(&[]).is_none());
        assert!(compute_route_statistics(&[wp("a", 0.0, 0.0, 0)]).is_none());
        // Two records but only one valid
        let route = vec![wp("a", 0.0, 0.0, 0), wp("bad", 91.0, 0.0, 60)];
        assert!(compute_route_statistics(&route).is_none());
    }

    #[test]
    fn test_simple_segment() {
        let route = vec![wp("a", 0.0, 0.0, 0), wp("b", 0.0, 0.01, 60)];
        let stats = compute_route_statistics(&route).unwrap();

        assert!(approx_eq(stats.total_distance_km, 1.112, 0.001));
        assert!(approx_eq(stats.total_duration_seconds, 60.0, 1e-9));
        assert!(approx_eq(stats.avg_speed_kmh, 66.72, 0.01));
        assert!(approx_eq(stats.max_speed_kmh, stats.avg_speed_kmh, 1e-9));
        assert_eq!(stats.speed_profile.len(), 1);
        assert_eq!(stats.speed_profile[0].index, 1);
        assert_eq!(stats.start_time, Some(t(0)));
        assert_eq!(stats.end_time, Some(t(60)));
        assert_eq!(stats.photo_count, 2);
    }

    #[test]
    fn test_jump_segment_rejected() {
        let base = vec![wp("a", 0.0, 0.0, 0), wp("b", 0.0, 0.01, 60)];
        let before = compute_route_statistics(&base).unwrap();

        let mut route = base.clone();
        // ~111 km away
        route.push(wp("jump", 1.0, 0.01, 120));
        let after = compute_route_statistics(&route).unwrap();

        assert!(approx_eq(after.total_distance_km, before.total_distance_km, 1e-12));
        assert_eq!(after.speed_profile, before.speed_profile);
        assert_eq!(after.photo_count, 3);
    }

    #[test]
    fn test_speed_rejected_but_distance_counted() {
        // 1 km covered in one second
        let route = vec![
            wp("a", 0.0, 0.0, 0),
            wp("b", 0.0, 0.01, 60),
            wp("c", 0.0, 0.018993, 61),
        ];
        let stats = compute_route_statistics(&route).unwrap();

        assert!(approx_eq(stats.total_distance_km, 2.1118, 0.001));
        assert_eq!(stats.speed_profile.len(), 1);
        assert!(stats.max_speed_kmh < MAX_SEGMENT_SPEED_KMH);
        assert!(approx_eq(stats.avg_speed_kmh, 66.72, 0.01));
    }

    #[test]
    fn test_zero_time_diff_has_no_speed() {
        let route = vec![wp("a", 0.0, 0.0, 0), wp("b", 0.0, 0.001, 0)];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(stats.total_distance_km > 0.0);
        assert!(stats.speed_profile.is_empty());
        assert_eq!(stats.avg_speed_kmh, 0.0);
        assert_eq!(stats.total_duration_seconds, 0.0);
    }

    #[test]
    fn test_avg_speed_fallback_to_distance_over_duration() {
        // Middle waypoint has no timestamp, so no segment speed is computable,
        // but the route still has a duration.
        let route = vec![
            wp("a", 0.0, 0.0, 0),
            Waypoint::new("b", 0.0, 0.005),
            wp("c", 0.0, 0.01, 600),
        ];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(stats.speed_profile.is_empty());
        assert!(approx_eq(stats.avg_speed_kmh, stats.total_distance_km / (600.0 / 3600.0), 1e-9));
        assert_eq!(stats.max_speed_kmh, 0.0);
    }

    #[test]
    fn test_elevation_gain_only_ascending() {
        let route = vec![
            wp("a", 0.0, 0.0, 0).with_altitude(100.0),
            wp("b", 0.0, 0.001, 60).with_altitude(90.0),
            wp("c", 0.0, 0.002, 120).with_altitude(120.0),
        ];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(approx_eq(stats.elevation_gain_m, 30.0, 1e-9));
        assert_eq!(stats.min_elevation_m, 90.0);
        assert_eq!(stats.max_elevation_m, 120.0);
        let profile: Vec<(u32, f64)> =
            stats.elevation_profile.iter().map(|p| (p.index, p.elevation)).collect();
        assert_eq!(profile, vec![(0, 100.0), (1, 90.0), (2, 120.0)]);
    }

    #[test]
    fn test_elevation_skips_missing_altitudes() {
        let route = vec![
            wp("a", 0.0, 0.0, 0).with_altitude(50.0),
            wp("b", 0.0, 0.001, 60),
            wp("c", 0.0, 0.002, 120).with_altitude(70.0),
        ];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(approx_eq(stats.elevation_gain_m, 20.0, 1e-9));
        assert_eq!(stats.elevation_profile.len(), 2);
        assert_eq!(stats.elevation_profile[1].index, 2);
    }

    #[test]
    fn test_no_altitude_data_gives_zero_elevation() {
        let route = vec![wp("a", 0.0, 0.0, 0), wp("b", 0.0, 0.001, 60)];
        let stats = compute_route_statistics(&route).unwrap();
        assert_eq!(stats.min_elevation_m, 0.0);
        assert_eq!(stats.max_elevation_m, 0.0);
        assert!(stats.elevation_profile.is_empty());
    }

    #[test]
    fn test_untimed_route() {
        let route = vec![Waypoint::new("a", 0.0, 0.0), Waypoint::new("b", 0.0, 0.01)];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(stats.start_time.is_none());
        assert!(stats.end_time.is_none());
        assert_eq!(stats.total_duration_seconds, 0.0);
        assert_eq!(stats.avg_speed_kmh, 0.0);
        assert!(stats.total_distance_km > 1.0);
    }

    #[test]
    fn test_single_timestamp_has_no_time_span() {
        let route = vec![wp("a", 0.0, 0.0, 0), Waypoint::new("b", 0.0, 0.01)];
        let stats = compute_route_statistics(&route).unwrap();
        assert!(stats.start_time.is_none());
        assert_eq!(stats.total_duration_seconds, 0.0);
    }

    #[test]
    fn test_unordered_input_duration_not_negative() {
        let route = vec![
            wp("late", 0.0, 0.01, 600),
            Waypoint::new("untimed", 0.0, 0.02),
            wp("early", 0.0, 0.0, 0),
        ];
        let stats = compute_route_statistics(&route).unwrap();
        assert_eq!(stats.start_time, Some(t(0)));
        assert_eq!(stats.end_time, Some(t(600)));
        assert_eq!(stats.total_duration_seconds, 600.0);
    }

    #[test]
    fn test_speed_profile_never_longer_than_segments() {
        let route: Vec<Waypoint> = (0..20)
            .map(|i| wp(&format!("p{}", i), 0.0, i as f64 * 0.001, i * 30))
            .collect();
        let stats = compute_route_statistics(&route).unwrap();
        assert!(stats.speed_profile.len() <= route.len() - 1);
        assert_eq!(stats.speed_profile.len(), 19);
    }

    #[test]
    fn test_serializes_camel_case() {
        let route = vec![wp("a", 0.0, 0.0, 0), wp("b", 0.0, 0.01, 60)];
        let stats = compute_route_statistics(&route).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("totalDistanceKm").is_some());
        assert!(json.get("elevationProfile").is_some());
        assert_eq!(json["speedProfile"][0]["index"], 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(3725.9), "01:02:05");
        assert_eq!(format_duration(90_000.0), "25:00:00");
        assert_eq!(format_duration(-1.0), "-");
        assert_eq!(format_duration(f64::NAN), "-");
    }

    #[test]
    fn test_report() {
        let route = vec![
            wp("a", 0.0, 0.0, 0).with_altitude(10.0),
            wp("b", 0.0, 0.01, 60).with_altitude(15.0),
        ];
        let report = compute_route_statistics(&route).unwrap().report();
        assert!(report.contains("Photos: 2"));
        assert!(report.contains("Distance: 1.11 km"));
        assert!(report.contains("Duration: 00:01:00"));
        assert!(report.contains("Start: 2024-05-01 10:00:00 UTC"));
        assert!(report.contains("- Gain: 5.0 m"));
    }
}

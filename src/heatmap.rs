//! Heatmap generation with dwell weighting.
//!
//! Creates a sparse grid of cells from photo waypoints. Waypoints are bucketed
//! by coordinates rounded to [`GRID_DECIMALS`] places (about 1 m at the
//! equator). Each cell's intensity is its photo count plus a bonus for how
//! long the photographer stayed there:
//!
//! ```text
//! intensity = count + min(dwell_minutes / 10, 10)
//! ```
//!
//! where `dwell_minutes` is the span between the earliest and latest photo in
//! the cell. The cap keeps one long stop from flattening the colour scale.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::Waypoint;

/// Decimal places kept when bucketing coordinates.
pub const GRID_DECIMALS: i32 = 5;

/// Minutes of dwell worth one unit of intensity.
pub const DWELL_MINUTES_PER_POINT: f64 = 10.0;

/// Upper bound on the dwell contribution to a cell's intensity.
pub const MAX_DWELL_BONUS: f64 = 10.0;

/// A single cell in the heatmap grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeatmapCell {
    /// Position of the first waypoint that landed in the cell
    pub latitude: f64,
    pub longitude: f64,
    /// Photo count plus bounded dwell bonus
    pub intensity: f64,
    pub count: u32,
    /// Span between earliest and latest photo, 0 with fewer than two timestamps
    pub dwell_minutes: f64,
}

/// Complete heatmap result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct HeatmapResult {
    /// Non-empty cells only (sparse representation), in first-seen order
    pub cells: Vec<HeatmapCell>,
    /// Maximum intensity for normalization
    pub max_intensity: f64,
}

// Internal cell data during construction
#[derive(Debug)]
struct CellBuilder {
    latitude: f64,
    longitude: f64,
    count: u32,
    timed_count: u32,
    first_visit: Option<DateTime<Utc>>,
    last_visit: Option<DateTime<Utc>>,
}

impl CellBuilder {
    fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            count: 0,
            timed_count: 0,
            first_visit: None,
            last_visit: None,
        }
    }

    fn dwell_minutes(&self) -> f64 {
        match (self.first_visit, self.last_visit) {
            (Some(first), Some(last)) if self.timed_count >= 2 => {
                (last - first).num_milliseconds() as f64 / 60_000.0
            }
            _ => 0.0,
        }
    }
}

/// Grid coordinate: coordinates scaled by 10^GRID_DECIMALS and rounded
type CellKey = (i64, i64);

/// Heatmap grid builder
struct HeatmapGrid {
    scale: f64,
    index: HashMap<CellKey, usize>,
    cells: Vec<CellBuilder>,
}

impl HeatmapGrid {
    fn new() -> Self {
        Self {
            scale: 10f64.powi(GRID_DECIMALS),
            index: HashMap::new(),
            cells: Vec::new(),
        }
    }

    fn cell_key(&self, lat: f64, lng: f64) -> CellKey {
        ((lat * self.scale).round() as i64, (lng * self.scale).round() as i64)
    }

    /// Add a point to the grid
    fn add_point(&mut self, lat: f64, lng: f64, timestamp: Option<DateTime<Utc>>) {
        let key = self.cell_key(lat, lng);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.cells.push(CellBuilder::new(lat, lng));
                self.index.insert(key, self.cells.len() - 1);
                self.cells.len() - 1
            }
        };
        let cell = &mut self.cells[slot];

        cell.count += 1;

        if let Some(ts) = timestamp {
            cell.timed_count += 1;
            cell.first_visit = Some(cell.first_visit.map_or(ts, |v| v.min(ts)));
            cell.last_visit = Some(cell.last_visit.map_or(ts, |v| v.max(ts)));
        }
    }

    /// Build the final heatmap result
    fn build(self) -> HeatmapResult {
        let cells: Vec<HeatmapCell> = self
            .cells
            .into_iter()
            .map(|builder| {
                let dwell_minutes = builder.dwell_minutes();
                let bonus = (dwell_minutes / DWELL_MINUTES_PER_POINT).min(MAX_DWELL_BONUS);
                HeatmapCell {
                    latitude: builder.latitude,
                    longitude: builder.longitude,
                    intensity: builder.count as f64 + bonus,
                    count: builder.count,
                    dwell_minutes,
                }
            })
            .collect();

        let max_intensity = cells.iter().map(|c| c.intensity).fold(0.0, f64::max);

        HeatmapResult { cells, max_intensity }
    }
}

/// Build the dwell-weighted heatmap grid from waypoints.
///
/// Waypoints with invalid coordinates are skipped.
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use photo_route::{Waypoint, build_heatmap_grid};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
/// let points = vec![
///     Waypoint::new("a", 48.858370, 2.294481).with_timestamp(t0),
///     Waypoint::new("b", 48.858372, 2.294479).with_timestamp(t0 + Duration::minutes(5)),
/// ];
///
/// let heatmap = build_heatmap_grid(&points);
/// assert_eq!(heatmap.cells.len(), 1);
/// assert!((heatmap.cells[0].intensity - 2.5).abs() < 1e-9);
/// ```
pub fn build_heatmap_grid(waypoints: &[Waypoint]) -> HeatmapResult {
    let mut grid = HeatmapGrid::new();

    for wp in waypoints {
        if !wp.is_valid() {
            warn!("[Heatmap] skipping '{}': invalid coordinates", wp.name);
            continue;
        }
        grid.add_point(wp.latitude, wp.longitude, wp.timestamp);
    }

    let result = grid.build();
    debug!(
        "[Heatmap] {} waypoints -> {} cells (max intensity {:.2})",
        waypoints.len(),
        result.cells.len(),
        result.max_intensity
    );
    result
}

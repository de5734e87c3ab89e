//! Example of extracting waypoints from many images on the rayon pool.
//!
//! Run with: cargo run --example parallel_extraction --features parallel
//!
//! A real application plugs in an EXIF reader. This example fakes one with a
//! closure that derives GPS tags from the image index.

use photo_route::{compute_route_statistics, extract_waypoints, GpsTags, ImageSource, Rational, Result};
use std::time::Instant;

/// Degrees as an EXIF DMS triple with microdegree precision
fn to_dms(value: f64) -> [Rational; 3] {
    let micro = (value.abs() * 1_000_000.0).round() as u32;
    [Rational::new(micro, 1_000_000), Rational::new(0, 1), Rational::new(0, 1)]
}

fn fake_exif_reader(_name: &str, bytes: &[u8]) -> Result<Option<GpsTags>> {
    let index = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

    // Every tenth image was taken indoors without a fix
    if index % 10 == 9 {
        return Ok(None);
    }

    let lat = 46.2044 + index as f64 * 0.0002;
    let lon = 6.1432 + index as f64 * 0.0001;
    let minutes = index * 2;

    Ok(Some(GpsTags {
        latitude: Some(to_dms(lat)),
        latitude_ref: Some('N'),
        longitude: Some(to_dms(lon)),
        longitude_ref: Some('E'),
        altitude: Some(Rational::new(375 + index, 1)),
        altitude_ref: Some(0),
        date_time: Some(format!("2024:06:01 {:02}:{:02}:00", 8 + minutes / 60, minutes % 60)),
    }))
}

fn main() {
    println!("Parallel Extraction Example\n");

    // Shuffled on purpose: normalization restores time order
    let mut sources: Vec<ImageSource> = (0u32..200)
        .map(|i| ImageSource::new(format!("DSC_{:04}.jpg", i), i.to_le_bytes().to_vec()))
        .collect();
    sources.reverse();

    let start = Instant::now();
    let waypoints = extract_waypoints(&fake_exif_reader, &sources);
    println!("Extracted {} waypoints in {:?}", waypoints.len(), start.elapsed());

    if let (Some(first), Some(last)) = (waypoints.first(), waypoints.last()) {
        println!("  route runs {} -> {}", first.name, last.name);
    }

    if let Some(stats) = compute_route_statistics(&waypoints) {
        println!("\n{}", stats.report());
    }
}

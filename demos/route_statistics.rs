//! Basic example of deriving a route from photo waypoints.
//!
//! Run with: cargo run --example route_statistics

use photo_route::{analyze_waypoints, format_coordinates, RawWaypoint};

fn main() {
    // A morning walk along the Thames, with two typical metadata problems
    let raw = vec![
        RawWaypoint::new("IMG_0101.jpg", 51.5007, -0.1246)
            .with_altitude(12.0)
            .with_timestamp_text("2024:05:01 09:00:00"),
        RawWaypoint::new("IMG_0103.jpg", 51.5033, -0.1196)
            .with_altitude(18.0)
            .with_timestamp_text("2024:05:01 09:20:00"),
        // Stale fix from the previous day's trip to Paris
        RawWaypoint::new("IMG_0102.jpg", 48.8584, 2.2945)
            .with_timestamp_text("2024:05:01 09:10:00"),
        RawWaypoint::new("IMG_0104.jpg", 51.5055, -0.0754)
            .with_altitude(9.0)
            .with_timestamp_text("2024:05:01 10:05:00"),
        RawWaypoint::new("IMG_0105.jpg", 51.5055, -0.0754)
            .with_timestamp_text("2024:05:01 10:35:00"),
        // Broken record, dropped during normalization
        RawWaypoint::new("IMG_0106.jpg", 151.0, -0.07),
    ];

    let analysis = analyze_waypoints(&raw);

    println!("Photo Route Example\n");
    println!("{} raw records -> {} valid waypoints\n", raw.len(), analysis.waypoints.len());

    for (i, wp) in analysis.waypoints.iter().enumerate() {
        println!(
            "  {}. {} at {}",
            i + 1,
            wp.name,
            format_coordinates(wp.latitude, wp.longitude, 4)
        );
    }

    match &analysis.statistics {
        Some(stats) => println!("\n{}\n", stats.report()),
        None => println!("\nNot enough waypoints for statistics\n"),
    }

    println!("Heatmap ({} cells, max intensity {:.2}):", analysis.heatmap.cells.len(), analysis.heatmap.max_intensity);
    for cell in &analysis.heatmap.cells {
        println!(
            "  [{:.4}, {:.4}] count={} dwell={:.0}min intensity={:.2}",
            cell.latitude, cell.longitude, cell.count, cell.dwell_minutes, cell.intensity
        );
    }

    println!(
        "\nMap center: {}",
        format_coordinates(analysis.center.latitude, analysis.center.longitude, 4)
    );
}

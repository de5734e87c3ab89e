//! Example of the bounded async extraction fan-out with progress reporting.
//!
//! Run with: cargo run --example async_extraction --features async

use photo_route::{
    build_heatmap_grid, extract_waypoints_async, ExtractConfig, GpsTags, ImageSource,
    PhotoRouteError, ProgressCallback, Rational, Result,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stand-in for an EXIF reader: the image bytes hold "lat,lon,datetime".
fn text_exif_reader(name: &str, bytes: &[u8]) -> Result<Option<GpsTags>> {
    // Simulate decoding cost
    std::thread::sleep(Duration::from_millis(5));

    let text = std::str::from_utf8(bytes).map_err(|e| PhotoRouteError::Extraction {
        name: name.to_string(),
        message: e.to_string(),
    })?;
    let mut parts = text.splitn(3, ',');
    let (Some(lat), Some(lon), Some(date_time)) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(None);
    };

    let dms = |value: &str| -> Option<[Rational; 3]> {
        let degrees: f64 = value.parse().ok()?;
        let micro = (degrees * 1_000_000.0).round() as u32;
        Some([Rational::new(micro, 1_000_000), Rational::new(0, 1), Rational::new(0, 1)])
    };

    Ok(Some(GpsTags {
        latitude: dms(lat),
        longitude: dms(lon),
        date_time: Some(date_time.to_string()),
        ..GpsTags::default()
    }))
}

#[tokio::main]
async fn main() {
    println!("Async Extraction Example\n");

    let sources: Vec<ImageSource> = (0..120)
        .map(|i| {
            // Three stops of 40 photos each, one photo per minute
            let stop = i / 40;
            let text = format!(
                "{:.6},{:.6},2024:07:20 {:02}:{:02}:00",
                45.4642 + stop as f64 * 0.01,
                9.1900,
                10 + i / 60,
                i % 60
            );
            ImageSource::new(format!("IMG_{:04}.heic", i), text.into_bytes())
        })
        .collect();

    let progress: ProgressCallback = Arc::new(|completed, total| {
        if completed % 20 == 0 || completed == total {
            println!("  progress: {}/{}", completed, total);
        }
    });

    let config = ExtractConfig { max_concurrency: 8 };
    let start = Instant::now();
    let waypoints = extract_waypoints_async(Arc::new(text_exif_reader), sources, &config, Some(progress)).await;
    println!("\nExtracted {} waypoints in {:?}", waypoints.len(), start.elapsed());

    let heatmap = build_heatmap_grid(&waypoints);
    println!("Heatmap: {} cells", heatmap.cells.len());
    for cell in &heatmap.cells {
        println!(
            "  [{:.4}, {:.4}] {} photos over {:.0} min -> intensity {:.1}",
            cell.latitude, cell.longitude, cell.count, cell.dwell_minutes, cell.intensity
        );
    }
}

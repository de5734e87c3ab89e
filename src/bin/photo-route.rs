//! photo-route CLI - route statistics for geotagged photo collections
//!
//! Usage:
//!   photo-route stats <waypoints.json> [--json]
//!   photo-route heatmap <waypoints.json> [--output <file>]
//!   photo-route gpx <waypoints.json> --output <file.gpx>
//!   photo-route analyze <waypoints.json> [--output <file>]
//!
//! Input is a JSON array of waypoint records:
//! `{"name": "...", "latitude": .., "longitude": .., "altitude": .., "timestamp": ..}`
//! where `altitude` and `timestamp` are optional. Timestamps may be ISO 8601
//! / RFC 3339 strings, EXIF `YYYY:MM:DD HH:MM:SS` strings or Unix epoch
//! milliseconds. Records with unusable values are skipped or lose the bad
//! field; only a file that is not a JSON array is rejected.

use clap::{Parser, Subcommand};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use photo_route::{
    analyze_waypoints, build_heatmap_grid, compute_route_statistics, format_coordinates,
    normalize_waypoints, raw_waypoints_from_json, spherical_centroid, write_gpx, RawWaypoint,
    Result, Waypoint,
};

#[derive(Parser)]
#[command(name = "photo-route")]
#[command(about = "Route statistics, heatmaps and GPX export for geotagged photos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print route statistics
    Stats {
        /// JSON file with waypoint records
        input: PathBuf,

        /// Print statistics as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },

    /// Build the dwell-weighted heatmap grid
    Heatmap {
        /// JSON file with waypoint records
        input: PathBuf,

        /// Write the heatmap JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the normalized route as GPX 1.1
    Gpx {
        /// JSON file with waypoint records
        input: PathBuf,

        /// Output GPX file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the full pipeline and print the analysis as JSON
    Analyze {
        /// JSON file with waypoint records
        input: PathBuf,

        /// Write the analysis JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Stats { input, json } => run_stats(&input, json),
        Commands::Heatmap { input, output } => run_heatmap(&input, output.as_deref()),
        Commands::Gpx { input, output } => run_gpx(&input, &output),
        Commands::Analyze { input, output } => run_analyze(&input, output.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load raw waypoint records from a JSON file
fn load_waypoints(path: &Path) -> Result<Vec<RawWaypoint>> {
    let text = fs::read_to_string(path)?;
    let raw = raw_waypoints_from_json(&text)?;
    info!("Loaded {} waypoint records from {}", raw.len(), path.display());
    Ok(raw)
}

fn load_normalized(path: &Path) -> Result<Vec<Waypoint>> {
    let raw = load_waypoints(path)?;
    let waypoints = normalize_waypoints(&raw);
    if waypoints.len() < raw.len() {
        info!("Dropped {} records with invalid coordinates", raw.len() - waypoints.len());
    }
    Ok(waypoints)
}

/// Write `contents` to `output`, or stdout when no path is given
fn emit(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}

fn run_stats(input: &Path, json: bool) -> Result<()> {
    let waypoints = load_normalized(input)?;

    let Some(stats) = compute_route_statistics(&waypoints) else {
        println!("Not enough valid waypoints for statistics ({} found, need 2)", waypoints.len());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", stats.report());

    let center = spherical_centroid(&waypoints);
    println!();
    println!("Center: {}", format_coordinates(center.latitude, center.longitude, 6));
    Ok(())
}

fn run_heatmap(input: &Path, output: Option<&Path>) -> Result<()> {
    let waypoints = load_normalized(input)?;
    let heatmap = build_heatmap_grid(&waypoints);
    debug!(
        "Heatmap: {} cells, max intensity {:.2}",
        heatmap.cells.len(),
        heatmap.max_intensity
    );
    emit(&serde_json::to_string_pretty(&heatmap)?, output)
}

fn run_gpx(input: &Path, output: &Path) -> Result<()> {
    let waypoints = load_normalized(input)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    write_gpx(&waypoints, &mut writer)?;
    writer.flush()?;
    println!("Wrote {} waypoints to {}", waypoints.len(), output.display());
    Ok(())
}

fn run_analyze(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = load_waypoints(input)?;
    let analysis = analyze_waypoints(&raw);
    emit(&serde_json::to_string_pretty(&analysis)?, output)
}

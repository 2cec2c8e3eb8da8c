//! starsift-gravity: build the gravity-source JSON for the map viewer
//!
//! Usage:
//!   starsift-gravity --interest-csv data/interest_grav.csv \
//!       --systems-coords-gz systemsWithCoordinates.json.gz --out-json data/processed/gravity_sources.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use starsift::output::{read_csv_records, write_json_document};
use starsift::pipeline::{build_gravity_sources, Provenance};
use starsift::{open_array, PipelineConfig, ScanOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starsift-gravity")]
#[command(about = "Place gravity bodies at their systems' coordinates", long_about = None)]
struct Args {
    /// Gravity-body CSV written by starsift-primary
    #[arg(long)]
    interest_csv: PathBuf,

    /// Systems dump (the full systemsWithCoordinates.json.gz is recommended)
    #[arg(long)]
    systems_coords_gz: PathBuf,

    /// Output JSON document
    #[arg(long)]
    out_json: PathBuf,

    /// Debug: stop scanning systems after N (0 = no limit)
    #[arg(long, default_value_t = 0)]
    limit_systems: usize,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        scan: ScanOptions::default().with_limit(args.limit_systems),
        ..PipelineConfig::default()
    };

    let interest = read_csv_records(&args.interest_csv)?;
    let systems = open_array(&args.systems_coords_gz, &config.scan)
        .with_context(|| format!("Failed to open systems dump: {}", args.systems_coords_gz.display()))?;

    let provenance = Provenance {
        interest_csv: args.interest_csv.display().to_string(),
        systems_dump: args.systems_coords_gz.display().to_string(),
    };
    let report = build_gravity_sources(&interest, systems, &config, provenance)?;

    write_json_document(&args.out_json, &report.document, args.pretty)?;

    report.summary.log();
    println!("Wrote: {}", args.out_json.display());
    println!("{}", report.summary);
    println!("Gravity sources: {}", report.document.meta.sources);
    println!("Interest rows missing coords: {}", report.document.meta.missing_coords);

    Ok(())
}

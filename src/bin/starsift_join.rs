//! starsift-join: attach primary-star info to a systems-with-coordinates dump
//!
//! Usage:
//!   starsift-join --systems-path systemsWithCoordinates.json.gz \
//!       --primary-csv data/primary_star.csv --out-csv data/systems_star_type.csv --only-matched
//!
//!   # Let systems whose id misses still match by name
//!   starsift-join ... --fallback

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use starsift::output::{read_csv_records, CsvSink};
use starsift::pipeline::{join_coords, load_primary_table, CoordsJoinConfig};
use starsift::{open_array, PipelineConfig, ProbePolicy, ScanOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starsift-join")]
#[command(about = "Join primary-star picks onto system coordinates", long_about = None)]
struct Args {
    /// Systems dump (systemsWithCoordinates*.json.gz)
    #[arg(long)]
    systems_path: PathBuf,

    /// Primary-star CSV written by starsift-primary
    #[arg(long)]
    primary_csv: PathBuf,

    /// Output CSV
    #[arg(long)]
    out_csv: PathBuf,

    /// Write only systems that matched a primary-star row
    #[arg(long)]
    only_matched: bool,

    /// Try id64 and name when a system's id is present but unmatched
    #[arg(long)]
    fallback: bool,

    /// Drop systems farther than this many light years from Sol
    #[arg(long)]
    max_radius_ly: Option<f64>,

    /// Stop after N systems (0 = no limit)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Log progress every N systems
    #[arg(long, default_value_t = 100_000)]
    progress_every: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        scan: ScanOptions::default().with_limit(args.limit),
        progress_every: args.progress_every,
        probe_policy: if args.fallback { ProbePolicy::Fallback } else { ProbePolicy::Strict },
    };
    let join_config = CoordsJoinConfig {
        only_matched: args.only_matched,
        max_radius_ly: args.max_radius_ly,
    };

    let primary_rows = read_csv_records(&args.primary_csv)?;
    let (table, build) = load_primary_table(&primary_rows);
    drop(primary_rows);
    if build.overwritten > 0 {
        tracing::warn!(overwritten = build.overwritten, "primary CSV repeats some system keys");
    }

    let systems = open_array(&args.systems_path, &config.scan)
        .with_context(|| format!("Failed to open systems dump: {}", args.systems_path.display()))?;
    let mut sink = CsvSink::create(&args.out_csv)?;
    let report = join_coords(systems, &table, &config, &join_config, &mut sink)?;

    report.summary.log();
    println!("Wrote: {}", args.out_csv.display());
    println!("{}", report.summary);
    println!("Matched primary star info for: {}", report.join.matched());
    println!("  - via systemId:   {}", report.join.via_id);
    println!("  - via systemId64: {}", report.join.via_id64);
    println!("  - via name:       {}", report.join.via_name);
    println!("  - unmatched:      {}", report.join.missed);
    println!("  - no identifier:  {}", report.join.unkeyed);

    Ok(())
}

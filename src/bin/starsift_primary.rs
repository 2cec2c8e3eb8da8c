//! starsift-primary: pick each system's primary star from a bodies dump
//!
//! Usage:
//!   starsift-primary --path bodies7days.json.gz \
//!       --out-primary data/primary_star.csv --out-interest data/interest_grav.csv
//!
//!   # Debug against the first 50k bodies only
//!   starsift-primary --path bodies.json.gz --out-primary p.csv --out-interest i.csv --limit 50000

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use starsift::output::CsvSink;
use starsift::pipeline::extract_primary;
use starsift::{open_array, PipelineConfig, ScanOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starsift-primary")]
#[command(about = "Extract primary stars and gravity bodies from a bodies dump", long_about = None)]
struct Args {
    /// Bodies dump (bodies*.json.gz)
    #[arg(long)]
    path: PathBuf,

    /// Output CSV of primary-star picks, one per system
    #[arg(long)]
    out_primary: PathBuf,

    /// Output CSV of black holes, neutron stars and white dwarfs
    #[arg(long)]
    out_interest: PathBuf,

    /// Stop after N bodies (0 = no limit)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Log progress every N bodies
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
        ..PipelineConfig::default()
    };

    let bodies = open_array(&args.path, &config.scan)
        .with_context(|| format!("Failed to open bodies dump: {}", args.path.display()))?;
    let extract = extract_primary(bodies, &config)?;

    let mut primary = CsvSink::create(&args.out_primary)?;
    primary.write_rows(&extract.primaries)?;
    primary.flush()?;

    let mut interest = CsvSink::create(&args.out_interest)?;
    interest.write_rows(&extract.grav_bodies)?;
    interest.flush()?;

    extract.summary.log();
    println!("{}", extract.summary);
    println!("Systems with a primary-star pick: {}", extract.primaries.len());
    println!("Interesting grav bodies (BH/NS/WD): {}", extract.grav_bodies.len());
    println!("\nTop star subTypes:");
    for (sub_type, count) in extract.sub_types.iter().take(25) {
        println!("{:>8}  {}", count, sub_type);
    }

    Ok(())
}

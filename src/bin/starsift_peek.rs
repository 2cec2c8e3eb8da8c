//! starsift-peek: print the first objects of a catalog dump as NDJSON
//!
//! Usage:
//!   # First 5 objects of a gzip dump
//!   starsift-peek systemsWithCoordinates.json.gz
//!
//!   # Whole array from stdin, as raw object text
//!   zcat bodies.json.gz | starsift-peek --limit 0 --raw

use anyhow::Result;
use clap::Parser;
use starsift::stream::{open_path, ArrayObjects, ByteSource, ReaderSource};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "starsift-peek")]
#[command(about = "Print objects from a JSON-array dump as NDJSON", long_about = None)]
struct Args {
    /// Dump file, gzip when named *.gz (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Number of objects to print (0 = all)
    #[arg(long, default_value_t = 5)]
    limit: usize,

    /// Print each object's text as found, without re-serializing it
    #[arg(long)]
    raw: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let limit = if args.limit == 0 { None } else { Some(args.limit) };

    match &args.input {
        Some(path) => {
            let source = open_path(path, starsift::stream::DEFAULT_BUFFER_CAPACITY)?;
            peek(source, limit, args.raw)
        }
        None => peek(ReaderSource::new(io::stdin().lock()), limit, args.raw),
    }
}

fn peek<S: ByteSource>(source: S, limit: Option<usize>, raw: bool) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());

    for object in ArrayObjects::new(source).with_limit(limit) {
        let object = object?;
        if raw {
            writeln!(out, "{}", object.text)?;
        } else {
            let value = object.parse()?;
            writeln!(out, "{}", serde_json::to_string(&value)?)?;
        }
    }

    out.flush()?;
    Ok(())
}

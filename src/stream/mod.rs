//! Streaming access to catalog dumps
//!
//! A dump is a (usually gzip-compressed) JSON array of objects. `open_array`
//! yields its elements one parsed object at a time.

pub mod decoder;
pub mod source;

pub use decoder::{ArrayObjects, ArrayScanner, ArrayValues, RawObject, ScanState, Step};
pub use source::{open_gz, open_path, ByteSource, GzSource, ReaderSource, DEFAULT_BUFFER_CAPACITY};

use crate::error::StreamError;
use std::io::BufRead;
use std::path::Path;

/// Options for one streaming pass
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Stop after this many array elements (debugging aid for huge dumps)
    pub limit: Option<usize>,

    /// Read-ahead buffer size for the decompressed text
    pub buffer_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            limit: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ScanOptions {
    /// Treat a limit of 0 as "no limit", as the command-line flags do
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }
}

/// Stream parsed objects out of a dump on disk (gzip when named `*.gz`)
pub fn open_array<P: AsRef<Path>>(
    path: P,
    options: &ScanOptions,
) -> Result<ArrayValues<ReaderSource<Box<dyn BufRead>>>, StreamError> {
    let source = open_path(path, options.buffer_capacity)?;
    Ok(ArrayValues::new(ArrayObjects::new(source).with_limit(options.limit)))
}

/// Stream parsed objects out of an already-open reader
pub fn read_array<R: BufRead>(reader: R, options: &ScanOptions) -> ArrayValues<ReaderSource<R>> {
    ArrayValues::new(ArrayObjects::new(ReaderSource::new(reader)).with_limit(options.limit))
}

//! Pull-based byte sources over (optionally gzip-compressed) catalog dumps.
//!
//! A source hands out one byte per call and keeps only its read buffer in
//! memory, so the decompressed size of a dump never matters.

use crate::error::StreamError;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Default read-ahead for decompressed text
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Sequential byte stream feeding the array decoder.
///
/// `Ok(None)` is the end of the stream; read failures are `Err`.
pub trait ByteSource {
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError>;

    /// Number of bytes handed out so far
    fn offset(&self) -> u64;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError> {
        (**self).next_byte()
    }

    fn offset(&self) -> u64 {
        (**self).offset()
    }
}

/// Byte source over any buffered reader
pub struct ReaderSource<R> {
    reader: R,
    offset: u64,
    gzip: bool,
}

/// Source over a gzip file on disk
pub type GzSource = ReaderSource<BufReader<MultiGzDecoder<File>>>;

impl<R: BufRead> ReaderSource<R> {
    /// Wrap an already-decompressed reader (stdin, an in-memory buffer, ...)
    pub fn new(reader: R) -> Self {
        ReaderSource { reader, offset: 0, gzip: false }
    }
}

impl<R: BufRead> ByteSource for ReaderSource<R> {
    fn next_byte(&mut self) -> Result<Option<u8>, StreamError> {
        let gzip = self.gzip;
        let byte = loop {
            match self.reader.fill_buf() {
                Ok(buf) => break buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_read_error(e, gzip)),
            }
        };

        if byte.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}

fn map_read_error(err: io::Error, gzip: bool) -> StreamError {
    if gzip && is_codec_error(&err) {
        StreamError::Gzip(err)
    } else {
        StreamError::Io(err)
    }
}

/// Errors flate2 raises for a damaged or cut-off gzip stream
fn is_codec_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
    )
}

/// Open a gzip-compressed dump.
///
/// The gzip header and first block are decoded before returning, so a file
/// that is not gzip at all fails here rather than halfway into a pass.
pub fn open_gz<P: AsRef<Path>>(path: P, capacity: usize) -> Result<GzSource, StreamError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StreamError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::with_capacity(capacity.max(1), MultiGzDecoder::new(file));
    reader.fill_buf().map_err(StreamError::Gzip)?;

    Ok(ReaderSource { reader, offset: 0, gzip: true })
}

/// Open a dump, decompressing when the file name ends in `.gz`
pub fn open_path<P: AsRef<Path>>(
    path: P,
    capacity: usize,
) -> Result<ReaderSource<Box<dyn BufRead>>, StreamError> {
    let path = path.as_ref();
    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gz {
        let gz = open_gz(path, capacity)?;
        return Ok(ReaderSource {
            reader: Box::new(gz.reader) as Box<dyn BufRead>,
            offset: 0,
            gzip: true,
        });
    }

    let file = File::open(path).map_err(|source| StreamError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderSource::new(
        Box::new(BufReader::with_capacity(capacity.max(1), file)) as Box<dyn BufRead>,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn drain<S: ByteSource>(mut source: S) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = source.next_byte().unwrap() {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_reader_source_yields_all_bytes() {
        let source = ReaderSource::new(Cursor::new(b"[{}]".to_vec()));
        assert_eq!(drain(source), b"[{}]");
    }

    #[test]
    fn test_offset_tracks_consumed_bytes() {
        let mut source = ReaderSource::new(Cursor::new(b"abc".to_vec()));
        source.next_byte().unwrap();
        source.next_byte().unwrap();
        assert_eq!(source.offset(), 2);
        source.next_byte().unwrap();
        assert_eq!(source.next_byte().unwrap(), None);
        assert_eq!(source.offset(), 3);
    }

    #[test]
    fn test_open_gz_roundtrip_small_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"[{\"id\": 1}]").unwrap();
        enc.finish().unwrap();

        let source = open_gz(&path, 4).unwrap();
        assert_eq!(drain(source), b"[{\"id\": 1}]");
    }

    #[test]
    fn test_open_gz_rejects_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.json.gz");
        std::fs::write(&path, b"[{\"id\": 1}]").unwrap();

        match open_gz(&path, DEFAULT_BUFFER_CAPACITY) {
            Err(StreamError::Gzip(_)) => {}
            other => panic!("expected gzip error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_cut_gzip_trailer_is_a_gzip_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.json.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"[{\"id\": 1}, {\"id\": 2}]").unwrap();
        let bytes = enc.finish().unwrap();
        // Drop the CRC32 and size trailer
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();

        let mut source = open_gz(&path, DEFAULT_BUFFER_CAPACITY).unwrap();
        let err = loop {
            match source.next_byte() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("cut stream ended cleanly"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, StreamError::Gzip(_)), "got {:?}", err);
    }

    #[test]
    fn test_codec_errors_map_to_gzip_only_for_gzip_sources() {
        let eof = || io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(map_read_error(eof(), true), StreamError::Gzip(_)));
        assert!(matches!(map_read_error(eof(), false), StreamError::Io(_)));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(map_read_error(denied, true), StreamError::Io(_)));
    }

    #[test]
    fn test_open_gz_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match open_gz(dir.path().join("nope.gz"), DEFAULT_BUFFER_CAPACITY) {
            Err(StreamError::Open { .. }) => {}
            other => panic!("expected open error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_path_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, b"[]").unwrap();

        let source = open_path(&path, DEFAULT_BUFFER_CAPACITY).unwrap();
        assert_eq!(drain(source), b"[]");
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures while streaming a catalog dump.
///
/// Any of these aborts the pass. `NotAnArray` and `Truncated` are kept apart
/// so a bad download can be told from a malformed upstream dump.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt gzip stream: {0}")]
    Gzip(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("not a JSON array: expected '[' at start, found {}", describe_byte(.found))]
    NotAnArray { found: Option<u8> },

    #[error("unexpected end of stream at byte {offset}: object {completed} is incomplete")]
    Truncated { offset: u64, completed: usize },

    #[error("array element {index} is not a valid JSON object: {source}")]
    MalformedObject {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn describe_byte(found: &Option<u8>) -> String {
    match *found {
        Some(b) if b.is_ascii_graphic() => format!("'{}'", b as char),
        Some(b) => format!("byte 0x{:02x}", b),
        None => "end of input".to_string(),
    }
}

/// What was wrong with a field that could not be typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldProblem {
    Missing,
    Unparseable,
}

impl FieldProblem {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldProblem::Missing => "missing",
            FieldProblem::Unparseable => "unparseable",
        }
    }
}

/// A recoverable coercion failure on one field of one record.
///
/// The record is rejected and counted; the stream continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' is {}", .problem.as_str())]
pub struct FieldError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn missing(field: &'static str) -> Self {
        FieldError { field, problem: FieldProblem::Missing }
    }

    pub fn unparseable(field: &'static str) -> Self {
        FieldError { field, problem: FieldProblem::Unparseable }
    }

    /// Key used in per-reason counters, e.g. `coords.x:missing`.
    pub fn reason(&self) -> String {
        format!("{}:{}", self.field, self.problem.as_str())
    }
}

//! Incremental decoder for a top-level JSON array of objects.
//!
//! The decoder never parses the whole document. `ArrayScanner` only tracks
//! brace depth and string/escape state to find where each top-level object
//! starts and ends; the bytes of one complete object are then handed to
//! `serde_json`. Memory use is the largest single object plus the source's
//! read buffer.
//!
//! Only the `[ {...}, {...}, ... ]` shape is supported. Commas, whitespace
//! and scalar elements between objects are skipped; string elements are
//! skipped whole, so a `{` or `]` inside one is not structural.

use crate::error::StreamError;
use crate::stream::source::ByteSource;
use serde_json::{Map, Value};
use std::iter::FusedIterator;

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// State of the boundary scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Before the opening `[`
    Start,
    /// Part-way through a UTF-8 byte-order mark
    Bom { matched: u8 },
    /// Between elements, looking for `{` or the closing `]`
    SeekObject,
    /// Inside a string element between objects
    SkipString { escaped: bool },
    /// Inside an object, outside any string
    InObject,
    /// Inside a string within an object
    InString,
    /// The byte after a backslash inside a string
    Escaped,
    /// The closing `]` was seen
    Done,
}

/// What the caller should do with the byte it just fed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not part of any object
    Skip,
    /// Append to the current object
    Take,
    /// Append; the current object is now complete
    Complete,
    /// The array is closed
    End,
}

/// Byte-at-a-time finite-state scanner locating top-level object boundaries.
#[derive(Debug, Clone)]
pub struct ArrayScanner {
    state: ScanState,
    depth: usize,
    offset: u64,
    completed: usize,
}

impl Default for ArrayScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayScanner {
    pub fn new() -> Self {
        ArrayScanner {
            state: ScanState::Start,
            depth: 0,
            offset: 0,
            completed: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Unmatched `{` in the current object
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Objects completed so far
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Advance the scanner by one byte
    pub fn feed(&mut self, byte: u8) -> Result<Step, StreamError> {
        let at = self.offset;
        self.offset += 1;

        let step = match self.state {
            ScanState::Start => {
                if at == 0 && byte == BOM[0] {
                    self.state = ScanState::Bom { matched: 1 };
                    Step::Skip
                } else if byte.is_ascii_whitespace() {
                    Step::Skip
                } else if byte == b'[' {
                    self.state = ScanState::SeekObject;
                    Step::Skip
                } else {
                    return Err(StreamError::NotAnArray { found: Some(byte) });
                }
            }
            ScanState::Bom { matched } => {
                if byte != BOM[matched as usize] {
                    return Err(StreamError::NotAnArray { found: Some(BOM[0]) });
                }
                self.state = if matched as usize + 1 == BOM.len() {
                    ScanState::Start
                } else {
                    ScanState::Bom { matched: matched + 1 }
                };
                Step::Skip
            }
            ScanState::SeekObject => match byte {
                b'{' => {
                    self.depth = 1;
                    self.state = ScanState::InObject;
                    Step::Take
                }
                b']' => {
                    self.state = ScanState::Done;
                    Step::End
                }
                b'"' => {
                    self.state = ScanState::SkipString { escaped: false };
                    Step::Skip
                }
                _ => Step::Skip,
            },
            ScanState::SkipString { escaped } => {
                self.state = match byte {
                    _ if escaped => ScanState::SkipString { escaped: false },
                    b'\\' => ScanState::SkipString { escaped: true },
                    b'"' => ScanState::SeekObject,
                    _ => ScanState::SkipString { escaped: false },
                };
                Step::Skip
            }
            ScanState::InObject => match byte {
                b'"' => {
                    self.state = ScanState::InString;
                    Step::Take
                }
                b'{' => {
                    self.depth += 1;
                    Step::Take
                }
                b'}' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.state = ScanState::SeekObject;
                        self.completed += 1;
                        Step::Complete
                    } else {
                        Step::Take
                    }
                }
                _ => Step::Take,
            },
            ScanState::InString => {
                match byte {
                    b'\\' => self.state = ScanState::Escaped,
                    b'"' => self.state = ScanState::InObject,
                    _ => {}
                }
                Step::Take
            }
            ScanState::Escaped => {
                self.state = ScanState::InString;
                Step::Take
            }
            ScanState::Done => Step::Skip,
        };

        Ok(step)
    }

    /// Signal end of input.
    ///
    /// Ending between elements is fine, even without the closing `]`;
    /// ending inside an object or a string element is a truncated stream.
    pub fn finish(&self) -> Result<(), StreamError> {
        match self.state {
            ScanState::SeekObject | ScanState::Done => Ok(()),
            ScanState::Start | ScanState::Bom { .. } => Err(StreamError::NotAnArray { found: None }),
            ScanState::InObject
            | ScanState::InString
            | ScanState::Escaped
            | ScanState::SkipString { .. } => {
                Err(StreamError::Truncated {
                    offset: self.offset,
                    completed: self.completed,
                })
            }
        }
    }
}

/// The unparsed text of one array element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// Position of the element in the array, from 0
    pub index: usize,
    pub text: String,
}

impl RawObject {
    pub fn parse(&self) -> Result<Map<String, Value>, StreamError> {
        serde_json::from_str(&self.text).map_err(|source| StreamError::MalformedObject {
            index: self.index,
            source,
        })
    }
}

/// Lazy sequence of raw top-level objects.
///
/// Not restartable: after the array ends, the element limit is hit, or a
/// fatal error is returned, every further call yields `None`.
pub struct ArrayObjects<S> {
    source: S,
    scanner: ArrayScanner,
    buf: Vec<u8>,
    yielded: usize,
    limit: Option<usize>,
    finished: bool,
}

impl<S: ByteSource> ArrayObjects<S> {
    pub fn new(source: S) -> Self {
        ArrayObjects {
            source,
            scanner: ArrayScanner::new(),
            buf: Vec::new(),
            yielded: 0,
            limit: None,
            finished: false,
        }
    }

    /// Stop after `limit` elements
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Elements yielded so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    fn fail(&mut self, err: StreamError) -> Option<Result<RawObject, StreamError>> {
        self.finished = true;
        self.buf = Vec::new();
        Some(Err(err))
    }
}

impl<S: ByteSource> Iterator for ArrayObjects<S> {
    type Item = Result<RawObject, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            self.finished = true;
            return None;
        }

        loop {
            let byte = match self.source.next_byte() {
                Ok(Some(b)) => b,
                Ok(None) => {
                    self.finished = true;
                    return match self.scanner.finish() {
                        Ok(()) => None,
                        Err(e) => self.fail(e),
                    };
                }
                Err(e) => return self.fail(e),
            };

            match self.scanner.feed(byte) {
                Ok(Step::Skip) => {}
                Ok(Step::Take) => self.buf.push(byte),
                Ok(Step::Complete) => {
                    self.buf.push(byte);
                    let text = String::from_utf8_lossy(&self.buf).into_owned();
                    self.buf.clear();

                    let raw = RawObject { index: self.yielded, text };
                    self.yielded += 1;
                    return Some(Ok(raw));
                }
                Ok(Step::End) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for ArrayObjects<S> {}

/// Lazy sequence of parsed top-level objects
pub struct ArrayValues<S> {
    inner: ArrayObjects<S>,
    failed: bool,
}

impl<S: ByteSource> ArrayValues<S> {
    pub fn new(inner: ArrayObjects<S>) -> Self {
        ArrayValues { inner, failed: false }
    }

    /// Elements yielded so far
    pub fn yielded(&self) -> usize {
        self.inner.yielded()
    }
}

impl<S: ByteSource> Iterator for ArrayValues<S> {
    type Item = Result<Map<String, Value>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self.inner.next()?.and_then(|raw| raw.parse());
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl<S: ByteSource> FusedIterator for ArrayValues<S> {}

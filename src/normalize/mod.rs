//! Record normalization
//!
//! Turns decoded array elements into typed records. A record that cannot be
//! typed is rejected and counted; it never stops the stream.

pub mod coerce;
pub mod records;

pub use coerce::{as_flag, as_float, as_int, as_text, as_uint, FieldExt};
pub use records::{BodyRecord, Coords, FromRaw, SystemRecord};

use crate::error::FieldError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Rejections seen during one pass, keyed by `field:problem`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectCounts {
    pub total: u64,
    pub by_reason: BTreeMap<String, u64>,
}

impl RejectCounts {
    pub fn record(&mut self, err: &FieldError) {
        self.total += 1;
        *self.by_reason.entry(err.reason()).or_insert(0) += 1;
    }
}

/// Stateless apart from its rejection counters
#[derive(Debug, Default)]
pub struct Normalizer {
    rejects: RejectCounts,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Type one record, or count it as rejected
    pub fn normalize<T: FromRaw>(&mut self, raw: &Map<String, Value>) -> Option<T> {
        match T::from_raw(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                trace!(reason = %err, "record rejected");
                self.rejects.record(&err);
                None
            }
        }
    }

    pub fn rejects(&self) -> &RejectCounts {
        &self.rejects
    }

    pub fn into_rejects(self) -> RejectCounts {
        self.rejects
    }
}

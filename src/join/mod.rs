//! Multi-key join resolution
//!
//! Catalog dumps identify a star system by a numeric id, a 64-bit id, or its
//! name, and not every record carries all three. Tables are built from one
//! dataset keyed by the first identifier available (id, then id64, then
//! name) and probed with records from another dataset.

pub mod key;
pub mod table;

pub use key::{JoinKey, KeyFields, KeyKind, NeededKeys};
pub use table::{BuildStats, JoinStats, JoinTable, JoinTableBuilder, Probe, ProbePolicy};

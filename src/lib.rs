//! # starsift - Catalog Dump Extraction Toolkit
//!
//! Streams huge gzip-compressed JSON catalog dumps (`[ {...}, {...}, ... ]`)
//! one object at a time and extracts small working subsets from them.
//!
//! ## Modules
//!
//! - **stream**: gzip byte sources and the incremental array decoder
//! - **normalize**: permissive coercion of loosely typed records
//! - **join**: multi-key (id, id64, name) join tables
//! - **pipeline**: primary-star extraction, coordinate join, gravity sources
//! - **output**: CSV and JSON artifacts
//!
//! ## Quick Start
//!
//! ### Streaming a dump
//!
//! ```rust
//! use starsift::stream::{read_array, ScanOptions};
//! use std::io::Cursor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dump = Cursor::new(r#"[{"id": 1, "name": "System {X}"}, {"id": 2}]"#);
//!
//! let mut count = 0;
//! for object in read_array(dump, &ScanOptions::default()) {
//!     let object = object?;
//!     assert!(object.contains_key("id"));
//!     count += 1;
//! }
//! assert_eq!(count, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Joining across datasets
//!
//! ```rust
//! use starsift::join::{JoinKey, JoinTableBuilder, KeyFields, ProbePolicy};
//! use serde_json::json;
//!
//! let mut builder = JoinTableBuilder::new();
//! builder.offer(JoinKey::first_of(Some(7), None, Some("Seven")), "K Star");
//! let (table, _stats) = builder.finish();
//!
//! let system = json!({"id": 7, "name": "Polaris"});
//! let probe = table.probe(system.as_object().unwrap(), &KeyFields::SYSTEMS, ProbePolicy::Strict);
//! assert_eq!(probe.hit(), Some(&"K Star"));
//! ```

pub mod config;
pub mod error;
pub mod join;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod stream;
pub mod summary;

// Re-export commonly used types for convenience
pub use config::PipelineConfig;
pub use error::{FieldError, FieldProblem, StreamError};
pub use join::{JoinKey, JoinTable, JoinTableBuilder, KeyFields, NeededKeys, Probe, ProbePolicy};
pub use normalize::{BodyRecord, Coords, Normalizer, SystemRecord};
pub use stream::{open_array, read_array, ArrayObjects, ArrayValues, ScanOptions};
pub use summary::ScanSummary;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_normalize_join() {
        let bodies = Cursor::new(
            r#"[{"systemId": 7, "systemName": "Seven", "type": "Star", "subType": "K Star"}]"#,
        );
        let systems = Cursor::new(
            r#"[{"id": 7, "name": "Seven", "coords": {"x": 1, "y": 2, "z": 3}},
                {"id": 8, "name": "Eight", "coords": {"x": "4", "y": "5", "z": "6"}},
                {"id": 9, "name": "Lost"}]"#,
        );

        let mut builder = JoinTableBuilder::new();
        for raw in read_array(bodies, &ScanOptions::default()) {
            let raw = raw.unwrap();
            builder.offer_record(&raw, &KeyFields::BODIES, raw.get("subType").cloned());
        }
        let (table, _) = builder.finish();

        let mut normalizer = Normalizer::new();
        let mut matched = Vec::new();
        for raw in read_array(systems, &ScanOptions::default()) {
            let Some(system) = normalizer.normalize::<SystemRecord>(&raw.unwrap()) else {
                continue;
            };
            let keys = JoinKey::all_of(system.id, system.id64, system.name.as_deref());
            if let Some(sub_type) = table.probe_keys(&keys, ProbePolicy::Strict).hit() {
                matched.push((system.name.clone(), sub_type.clone()));
            }
        }

        assert_eq!(matched, vec![(Some("Seven".to_string()), Some(serde_json::json!("K Star")))]);
        assert_eq!(normalizer.rejects().total, 1);
    }
}

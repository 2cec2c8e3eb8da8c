//! Coordinate join: attach primary-star information to every system of a
//! systems-with-coordinates dump.

use crate::config::PipelineConfig;
use crate::error::StreamError;
use crate::join::{BuildStats, JoinKey, JoinStats, JoinTable, JoinTableBuilder, KeyFields, Probe};
use crate::normalize::{FieldExt, Normalizer, SystemRecord};
use crate::output::CsvSink;
use crate::summary::ScanSummary;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use tracing::info;

/// Primary-star columns carried over from the primary-star CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryInfo {
    pub star_name: Option<String>,
    pub sub_type: Option<String>,
}

/// Index primary-star rows under every identifier each row carries
pub fn load_primary_table(rows: &[Map<String, Value>]) -> (JoinTable<PrimaryInfo>, BuildStats) {
    let mut builder = JoinTableBuilder::new();
    for row in rows {
        let info = PrimaryInfo {
            star_name: row.text("primaryStarName"),
            sub_type: row.text("primaryStarSubType"),
        };
        builder.insert_every_key(JoinKey::all_from_record(row, &KeyFields::BODIES), info);
    }

    let (table, stats) = builder.finish();
    let (by_id, by_id64, by_name) = table.sizes();
    info!(rows = rows.len(), by_id, by_id64, by_name, "primary-star table loaded");
    (table, stats)
}

/// Options specific to the coordinate join
#[derive(Debug, Clone, Default)]
pub struct CoordsJoinConfig {
    /// Write only systems that matched a primary-star row
    pub only_matched: bool,

    /// Drop systems farther than this from Sol
    pub max_radius_ly: Option<f64>,
}

/// One output row of the coordinate join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStarRow {
    pub name: Option<String>,
    pub id: Option<i64>,
    pub id64: Option<u64>,
    pub date: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub primary_type: String,
    #[serde(rename = "primary_subType")]
    pub primary_sub_type: String,
    pub primary_star_name: String,
}

impl SystemStarRow {
    fn new(system: SystemRecord, primary: Option<&PrimaryInfo>) -> Self {
        let star_name = primary.and_then(|p| p.star_name.clone()).unwrap_or_default();
        let sub_type = primary.and_then(|p| p.sub_type.clone()).unwrap_or_default();
        // Only the sub-type is exported upstream; a known sub-type implies a star
        let primary_type = if sub_type.is_empty() { String::new() } else { "Star".to_string() };

        SystemStarRow {
            name: system.name,
            id: system.id,
            id64: system.id64,
            date: system.date,
            x: system.coords.x,
            y: system.coords.y,
            z: system.coords.z,
            primary_type,
            primary_sub_type: sub_type,
            primary_star_name: star_name,
        }
    }
}

/// Counters from one coordinate-join pass
#[derive(Debug, Clone)]
pub struct CoordsJoinReport {
    pub summary: ScanSummary,
    pub join: JoinStats,
}

/// Stream systems, resolve each against `table`, and write joined rows
pub fn join_coords<I, W>(
    systems: I,
    table: &JoinTable<PrimaryInfo>,
    config: &PipelineConfig,
    join_config: &CoordsJoinConfig,
    sink: &mut CsvSink<W>,
) -> Result<CoordsJoinReport>
where
    I: IntoIterator<Item = Result<Map<String, Value>, StreamError>>,
    W: Write,
{
    let mut summary = ScanSummary::new("systems");
    let mut stats = JoinStats::default();
    let mut normalizer = Normalizer::new();

    for raw in systems {
        let raw = raw?;
        summary.scanned += 1;
        if config.should_report(summary.scanned) {
            info!(scanned = summary.scanned, matched = stats.matched(), "joining systems");
        }

        let Some(system) = normalizer.normalize::<SystemRecord>(&raw) else {
            continue;
        };

        if let Some(radius) = join_config.max_radius_ly {
            if system.coords.distance_to_sol() > radius {
                summary.reject("outside_radius");
                continue;
            }
        }

        let keys = JoinKey::all_of(system.id, system.id64, system.name.as_deref());
        let probe = table.probe_keys(&keys, config.probe_policy);
        stats.record(&probe);

        let primary = match probe {
            Probe::Hit { value, .. } => Some(value),
            Probe::Miss { .. } | Probe::Unkeyed => None,
        };
        if primary.is_none() && join_config.only_matched {
            summary.reject("unmatched");
            continue;
        }

        sink.write_row(&SystemStarRow::new(system, primary))?;
        summary.kept += 1;
    }

    summary.absorb(normalizer.rejects());
    sink.flush()?;

    Ok(CoordsJoinReport { summary, join: stats })
}

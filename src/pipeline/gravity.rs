//! Gravity sources: place the remnant bodies found by the primary-star pass
//! at their systems' coordinates.
//!
//! Only the systems named by the gravity-body CSV are kept while streaming
//! the systems dump, so memory stays proportional to that CSV.

use crate::config::PipelineConfig;
use crate::error::StreamError;
use crate::join::{BuildStats, JoinKey, JoinTableBuilder, NeededKeys};
use crate::normalize::{Coords, FieldExt, Normalizer, SystemRecord};
use crate::pipeline::classify::GravKind;
use crate::summary::ScanSummary;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

const COORDS_NOTE: &str =
    "Coordinates are system (star) coords. distanceToArrival is retained for reference but not used for positioning.";

/// System data kept from the systems dump
#[derive(Debug, Clone, PartialEq)]
struct SystemPlacement {
    name: String,
    id64: Option<u64>,
    coords: Coords,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GravitySource {
    pub id: String,
    pub kind: GravKind,
    #[serde(rename = "subType")]
    pub sub_type: String,
    pub system: String,
    #[serde(rename = "systemId")]
    pub system_id: i64,
    #[serde(rename = "systemId64")]
    pub system_id64: Option<u64>,
    pub body_name: String,
    pub body_id64: Option<u64>,
    #[serde(rename = "distanceToArrival")]
    pub distance_to_arrival: Option<f64>,
    pub weight: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GravityMeta {
    pub source_interest_csv: String,
    pub source_systems_coords: String,
    pub sources: usize,
    pub missing_coords: u64,
    pub note: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GravityDocument {
    pub meta: GravityMeta,
    pub sources: Vec<GravitySource>,
}

/// Where the inputs came from, recorded in the document's metadata
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub interest_csv: String,
    pub systems_dump: String,
}

#[derive(Debug, Clone)]
pub struct GravityReport {
    pub document: GravityDocument,
    pub summary: ScanSummary,
    pub build: BuildStats,
}

/// Join gravity-body rows to system coordinates streamed from `systems`
pub fn build_gravity_sources<I>(
    interest: &[Map<String, Value>],
    systems: I,
    config: &PipelineConfig,
    provenance: Provenance,
) -> Result<GravityReport>
where
    I: IntoIterator<Item = Result<Map<String, Value>, StreamError>>,
{
    let rows: Vec<(i64, &Map<String, Value>)> = interest
        .iter()
        .filter_map(|row| row.int("systemId").map(|sid| (sid, row)))
        .collect();
    if rows.len() < interest.len() {
        warn!(skipped = interest.len() - rows.len(), "gravity rows without a systemId");
    }

    let needed: NeededKeys = rows.iter().map(|(sid, _)| JoinKey::ById(*sid)).collect();
    info!(rows = rows.len(), systems = needed.len(), "gravity rows loaded");

    let mut summary = ScanSummary::new("systems");
    let mut normalizer = Normalizer::new();
    let mut builder = JoinTableBuilder::with_needed(needed);

    for raw in systems {
        let raw = raw?;
        summary.scanned += 1;
        if config.should_report(summary.scanned) {
            info!(scanned = summary.scanned, matched = summary.kept, "scanning systems");
        }

        // Check the id before typing the record; almost every system is unneeded
        let key = raw.int("id").map(JoinKey::ById);
        if key.as_ref().map_or(true, |k| !builder.wants(k)) {
            builder.offer(key, None);
            continue;
        }

        let Some(system) = normalizer.normalize::<SystemRecord>(&raw) else {
            continue;
        };
        let placement = SystemPlacement {
            name: system.name.unwrap_or_default(),
            id64: system.id64,
            coords: system.coords,
        };
        builder.offer(key, Some(placement));
        summary.kept += 1;
    }
    summary.absorb(normalizer.rejects());

    let (table, build) = builder.finish();

    let mut sources = Vec::new();
    let mut missing_coords = 0u64;
    for (sid, row) in rows {
        let Some(Some(placement)) = table.get(&JoinKey::ById(sid)) else {
            missing_coords += 1;
            continue;
        };

        let sub_type = row.text("subType").unwrap_or_default();
        let kind = GravKind::classify(&sub_type);
        let body_name = row.text("bodyName").unwrap_or_default();
        let body_id64 = row.uint("id64");

        let id = match body_id64 {
            Some(id64) => id64.to_string(),
            None if body_name.is_empty() => format!("{}:{}", sid, kind.code()),
            None => format!("{}:{}", sid, body_name),
        };

        sources.push(GravitySource {
            id,
            kind,
            sub_type,
            system: placement.name.clone(),
            system_id: sid,
            system_id64: row.uint("systemId64").or(placement.id64),
            body_name,
            body_id64,
            distance_to_arrival: row.float("distanceToArrival"),
            weight: kind.weight(),
            x: placement.coords.x,
            y: placement.coords.y,
            z: placement.coords.z,
        });
    }

    info!(sources = sources.len(), missing_coords, "gravity sources built");

    let document = GravityDocument {
        meta: GravityMeta {
            source_interest_csv: provenance.interest_csv,
            source_systems_coords: provenance.systems_dump,
            sources: sources.len(),
            missing_coords,
            note: COORDS_NOTE,
        },
        sources,
    };

    Ok(GravityReport { document, summary, build })
}

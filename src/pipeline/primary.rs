//! Primary-star extraction from a bodies dump.
//!
//! One pass over the bodies dump picks, for every system, the star most
//! likely to be its primary, and collects the compact remnants (black holes,
//! neutron stars, white dwarfs) along the way.

use crate::config::PipelineConfig;
use crate::error::StreamError;
use crate::join::JoinKey;
use crate::normalize::{BodyRecord, Normalizer};
use crate::pipeline::classify::GravKind;
use crate::summary::ScanSummary;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::info;

/// Best primary-star pick for one system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryStarRow {
    pub system_name: Option<String>,
    pub system_id: Option<i64>,
    pub system_id64: Option<u64>,
    pub primary_star_name: Option<String>,
    pub primary_star_sub_type: Option<String>,
    pub distance_to_arrival: Option<f64>,
    pub id64: Option<u64>,
    pub update_time: Option<String>,
}

/// A black hole, neutron star, or white dwarf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GravBodyRow {
    pub system_name: Option<String>,
    pub system_id: Option<i64>,
    pub system_id64: Option<u64>,
    pub body_name: Option<String>,
    pub sub_type: String,
    pub distance_to_arrival: Option<f64>,
    pub id64: Option<u64>,
    pub update_time: Option<String>,
}

/// Everything one bodies pass produces
#[derive(Debug, Clone)]
pub struct PrimaryExtract {
    /// Sorted by key kind, then key value as text
    pub primaries: Vec<PrimaryStarRow>,
    /// In dump order
    pub grav_bodies: Vec<GravBodyRow>,
    /// Star sub-types, most common first
    pub sub_types: Vec<(String, u64)>,
    pub summary: ScanSummary,
}

/// Whether `candidate` should replace `current` as a system's primary.
///
/// A main star beats a non-main star; otherwise the body closer to the
/// arrival point wins. Unknown distances sort last.
pub fn is_better_primary(candidate: &BodyRecord, current: &BodyRecord) -> bool {
    let distance = |b: &BodyRecord| b.distance_to_arrival.unwrap_or(f64::INFINITY);

    if candidate.is_main_star != current.is_main_star {
        return candidate.is_main_star;
    }
    distance(candidate) < distance(current)
}

/// Run the primary-star pass over decoded bodies
pub fn extract_primary<I>(bodies: I, config: &PipelineConfig) -> Result<PrimaryExtract>
where
    I: IntoIterator<Item = Result<Map<String, Value>, StreamError>>,
{
    let mut summary = ScanSummary::new("bodies");
    let mut normalizer = Normalizer::new();
    let mut best: HashMap<JoinKey, BodyRecord> = HashMap::new();
    let mut grav_bodies = Vec::new();
    let mut sub_types: HashMap<String, u64> = HashMap::new();

    for raw in bodies {
        let raw = raw?;
        summary.scanned += 1;
        if config.should_report(summary.scanned) {
            info!(scanned = summary.scanned, systems = best.len(), "scanning bodies");
        }

        let Some(body) = normalizer.normalize::<BodyRecord>(&raw) else {
            continue;
        };
        if !body.is_star() {
            summary.reject("not_a_star");
            continue;
        }
        let Some(key) = JoinKey::first_of(body.system_id, body.system_id64, body.system_name.as_deref())
        else {
            summary.reject("unkeyed");
            continue;
        };
        summary.kept += 1;

        if let Some(sub_type) = &body.sub_type {
            *sub_types.entry(sub_type.clone()).or_insert(0) += 1;

            if GravKind::classify(sub_type).is_interesting() {
                grav_bodies.push(GravBodyRow {
                    system_name: body.system_name.clone(),
                    system_id: body.system_id,
                    system_id64: body.system_id64,
                    body_name: body.name.clone(),
                    sub_type: sub_type.clone(),
                    distance_to_arrival: body.distance_to_arrival,
                    id64: body.id64,
                    update_time: body.update_time.clone(),
                });
            }
        }

        let replace = best
            .get(&key)
            .map_or(true, |current| is_better_primary(&body, current));
        if replace {
            best.insert(key, body);
        }
    }

    summary.absorb(normalizer.rejects());

    let mut picks: Vec<(JoinKey, BodyRecord)> = best.into_iter().collect();
    picks.sort_by(|(a, _), (b, _)| (a.kind(), a.value_text()).cmp(&(b.kind(), b.value_text())));

    let primaries = picks
        .into_iter()
        .map(|(_, body)| PrimaryStarRow {
            system_name: body.system_name,
            system_id: body.system_id,
            system_id64: body.system_id64,
            primary_star_name: body.name,
            primary_star_sub_type: body.sub_type,
            distance_to_arrival: body.distance_to_arrival,
            id64: body.id64,
            update_time: body.update_time,
        })
        .collect();

    let mut sub_types: Vec<(String, u64)> = sub_types.into_iter().collect();
    sub_types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(PrimaryExtract {
        primaries,
        grav_bodies,
        sub_types,
        summary,
    })
}

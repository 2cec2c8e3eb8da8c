//! Join tables: a single-writer build phase followed by read-only probing.
//!
//! `JoinTableBuilder` is the only thing that can insert. `finish` hands back
//! a `JoinTable` with no mutators, so a probe pass can never interleave with
//! the build pass and the table can be shared across threads.

use crate::join::key::{JoinKey, KeyFields, KeyKind, NeededKeys};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// How a probing record's identifiers are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbePolicy {
    /// Only the record's highest-priority identifier is looked up. A record
    /// that carries an id never matches by name, even when the id misses.
    #[default]
    Strict,
    /// Every identifier the record carries is tried in priority order
    Fallback,
}

/// Result of resolving one record against a table
#[derive(Debug, PartialEq)]
pub enum Probe<'a, T> {
    Hit { via: KeyKind, value: &'a T },
    /// The record had a key but nothing matched; `key` is its first key
    Miss { key: JoinKey },
    /// The record carried no usable identifier
    Unkeyed,
}

impl<'a, T> Probe<'a, T> {
    pub fn hit(&self) -> Option<&'a T> {
        match self {
            Probe::Hit { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Frozen lookup tables, one per identifier kind
#[derive(Debug, Clone)]
pub struct JoinTable<T> {
    by_id: HashMap<i64, T>,
    by_id64: HashMap<u64, T>,
    by_name: HashMap<String, T>,
}

impl<T> Default for JoinTable<T> {
    fn default() -> Self {
        JoinTable {
            by_id: HashMap::new(),
            by_id64: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T> JoinTable<T> {
    pub fn get(&self, key: &JoinKey) -> Option<&T> {
        match key {
            JoinKey::ById(v) => self.by_id.get(v),
            JoinKey::ById64(v) => self.by_id64.get(v),
            JoinKey::ByName(n) => self.by_name.get(n),
        }
    }

    /// Resolve a record's keys (priority order, as from `JoinKey::all_of`)
    pub fn probe_keys(&self, keys: &[JoinKey], policy: ProbePolicy) -> Probe<'_, T> {
        let Some(first) = keys.first() else {
            return Probe::Unkeyed;
        };

        let candidates = match policy {
            ProbePolicy::Strict => &keys[..1],
            ProbePolicy::Fallback => keys,
        };

        for key in candidates {
            if let Some(value) = self.get(key) {
                return Probe::Hit { via: key.kind(), value };
            }
        }

        Probe::Miss { key: first.clone() }
    }

    /// Resolve a decoded record whose identifiers live under `fields`
    pub fn probe(
        &self,
        record: &Map<String, Value>,
        fields: &KeyFields,
        policy: ProbePolicy,
    ) -> Probe<'_, T> {
        self.probe_keys(&JoinKey::all_from_record(record, fields), policy)
    }

    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_id64.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry counts as `(by_id, by_id64, by_name)`
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.by_id.len(), self.by_id64.len(), self.by_name.len())
    }
}

/// Counters from a build pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub inserted: u64,
    /// Insertions that replaced an earlier entry under the same key
    pub overwritten: u64,
    /// Records whose key was not in the needed set
    pub dropped: u64,
    /// Records with no usable identifier
    pub skipped: u64,
}

/// Single writer for a `JoinTable`
#[derive(Debug)]
pub struct JoinTableBuilder<T> {
    table: JoinTable<T>,
    needed: Option<NeededKeys>,
    stats: BuildStats,
}

impl<T> Default for JoinTableBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JoinTableBuilder<T> {
    /// A builder that keeps every keyed record
    pub fn new() -> Self {
        JoinTableBuilder {
            table: JoinTable::default(),
            needed: None,
            stats: BuildStats::default(),
        }
    }

    /// A builder that keeps only records whose key is in `needed`
    pub fn with_needed(needed: NeededKeys) -> Self {
        JoinTableBuilder {
            needed: Some(needed),
            ..Self::new()
        }
    }

    /// Whether a record under `key` would be kept
    pub fn wants(&self, key: &JoinKey) -> bool {
        self.needed.as_ref().map_or(true, |needed| needed.contains(key))
    }

    fn insert(&mut self, key: JoinKey, value: T) {
        let replaced = match key {
            JoinKey::ById(v) => self.table.by_id.insert(v, value).is_some(),
            JoinKey::ById64(v) => self.table.by_id64.insert(v, value).is_some(),
            JoinKey::ByName(ref n) => self.table.by_name.insert(n.clone(), value).is_some(),
        };

        self.stats.inserted += 1;
        if replaced {
            self.stats.overwritten += 1;
            debug!(%key, "join key seen twice, keeping the later record");
        }
    }

    /// Offer one side-dataset record under its highest-priority key.
    ///
    /// Returns whether the record was kept. Later records with the same key
    /// replace earlier ones.
    pub fn offer(&mut self, key: Option<JoinKey>, value: T) -> bool {
        let Some(key) = key else {
            self.stats.skipped += 1;
            return false;
        };

        if !self.wants(&key) {
            self.stats.dropped += 1;
            return false;
        }

        self.insert(key, value);
        true
    }

    /// Offer a decoded record, keyed by the fields in `fields`
    pub fn offer_record(&mut self, record: &Map<String, Value>, fields: &KeyFields, value: T) -> bool {
        self.offer(JoinKey::from_record(record, fields), value)
    }

    /// Index one record under every key it carries that the builder wants
    pub fn insert_every_key(&mut self, keys: Vec<JoinKey>, value: T) -> bool
    where
        T: Clone,
    {
        if keys.is_empty() {
            self.stats.skipped += 1;
            return false;
        }

        let wanted: Vec<JoinKey> = keys.into_iter().filter(|k| self.wants(k)).collect();
        if wanted.is_empty() {
            self.stats.dropped += 1;
            return false;
        }

        for key in wanted {
            self.insert(key, value.clone());
        }
        true
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// End the build phase
    pub fn finish(self) -> (JoinTable<T>, BuildStats) {
        (self.table, self.stats)
    }
}

/// Counters from a probe pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    pub via_id: u64,
    pub via_id64: u64,
    pub via_name: u64,
    pub missed: u64,
    pub unkeyed: u64,
}

impl JoinStats {
    pub fn record<T>(&mut self, probe: &Probe<'_, T>) {
        match probe {
            Probe::Hit { via: KeyKind::Id, .. } => self.via_id += 1,
            Probe::Hit { via: KeyKind::Id64, .. } => self.via_id64 += 1,
            Probe::Hit { via: KeyKind::Name, .. } => self.via_name += 1,
            Probe::Miss { .. } => self.missed += 1,
            Probe::Unkeyed => self.unkeyed += 1,
        }
    }

    pub fn matched(&self) -> u64 {
        self.via_id + self.via_id64 + self.via_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_counts_and_overwrites() {
        let mut builder = JoinTableBuilder::new();
        assert!(builder.offer(Some(JoinKey::ById(1)), "first"));
        assert!(builder.offer(Some(JoinKey::ById(1)), "second"));
        assert!(!builder.offer(None, "nothing"));

        let (table, stats) = builder.finish();
        assert_eq!(table.get(&JoinKey::ById(1)), Some(&"second"));
        assert_eq!(stats, BuildStats { inserted: 2, overwritten: 1, dropped: 0, skipped: 1 });
    }

    #[test]
    fn test_insert_every_key() {
        let mut builder = JoinTableBuilder::new();
        let keys = JoinKey::all_of(Some(3), Some(33), Some("Tri"));
        assert!(builder.insert_every_key(keys, "row"));

        let (table, _) = builder.finish();
        assert_eq!(table.sizes(), (1, 1, 1));
        assert_eq!(table.get(&JoinKey::ByName("Tri".into())), Some(&"row"));
    }

    #[test]
    fn test_insert_every_key_respects_needed() {
        let needed: NeededKeys = [JoinKey::ById64(33)].into_iter().collect();
        let mut builder = JoinTableBuilder::with_needed(needed);

        assert!(builder.insert_every_key(JoinKey::all_of(Some(3), Some(33), None), 1));
        assert!(!builder.insert_every_key(JoinKey::all_of(Some(4), None, Some("x")), 2));

        let (table, stats) = builder.finish();
        assert_eq!(table.sizes(), (0, 1, 0));
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn test_strict_probe_does_not_fall_back() {
        let mut builder = JoinTableBuilder::new();
        builder.offer(Some(JoinKey::ByName("Sol".into())), "sol");
        let (table, _) = builder.finish();

        let keys = JoinKey::all_of(Some(99), None, Some("Sol"));
        assert_eq!(
            table.probe_keys(&keys, ProbePolicy::Strict),
            Probe::Miss { key: JoinKey::ById(99) }
        );
        assert_eq!(
            table.probe_keys(&keys, ProbePolicy::Fallback),
            Probe::Hit { via: KeyKind::Name, value: &"sol" }
        );
        assert_eq!(table.probe_keys(&[], ProbePolicy::Fallback), Probe::Unkeyed);
    }

    #[test]
    fn test_join_stats() {
        let mut stats = JoinStats::default();
        stats.record(&Probe::Hit { via: KeyKind::Id64, value: &1 });
        stats.record(&Probe::Miss::<'_, i32> { key: JoinKey::ById(1) });
        stats.record(&Probe::<i32>::Unkeyed);

        assert_eq!(stats.matched(), 1);
        assert_eq!((stats.via_id64, stats.missed, stats.unkeyed), (1, 1, 1));
    }
}

use crate::normalize::coerce::FieldExt;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Identifier used to match records across datasets.
///
/// Variants are listed in priority order. The absence of any identifier is
/// `Option::<JoinKey>::None`, never a sentinel value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum JoinKey {
    ById(i64),
    ById64(u64),
    ByName(String),
}

/// Which identifier a key (or a join hit) came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum KeyKind {
    Id,
    Id64,
    Name,
}

impl KeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Id => "id",
            KeyKind::Id64 => "id64",
            KeyKind::Name => "name",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JoinKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            JoinKey::ById(_) => KeyKind::Id,
            JoinKey::ById64(_) => KeyKind::Id64,
            JoinKey::ByName(_) => KeyKind::Name,
        }
    }

    /// The key value as text, for sorting and display
    pub fn value_text(&self) -> String {
        match self {
            JoinKey::ById(v) => v.to_string(),
            JoinKey::ById64(v) => v.to_string(),
            JoinKey::ByName(name) => name.clone(),
        }
    }

    /// Every identifier present, in priority order
    pub fn all_of(id: Option<i64>, id64: Option<u64>, name: Option<&str>) -> Vec<JoinKey> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let mut keys = Vec::with_capacity(3);
        keys.extend(id.map(JoinKey::ById));
        keys.extend(id64.map(JoinKey::ById64));
        keys.extend(name.map(|n| JoinKey::ByName(n.to_string())));
        keys
    }

    /// The highest-priority identifier present
    pub fn first_of(id: Option<i64>, id64: Option<u64>, name: Option<&str>) -> Option<JoinKey> {
        Self::all_of(id, id64, name).into_iter().next()
    }

    pub fn all_from_record(record: &Map<String, Value>, fields: &KeyFields) -> Vec<JoinKey> {
        Self::all_of(
            record.int(fields.id),
            record.uint(fields.id64),
            record.text(fields.name).as_deref(),
        )
    }

    pub fn from_record(record: &Map<String, Value>, fields: &KeyFields) -> Option<JoinKey> {
        Self::all_from_record(record, fields).into_iter().next()
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.value_text())
    }
}

/// Names of the three identifier fields in one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFields {
    pub id: &'static str,
    pub id64: &'static str,
    pub name: &'static str,
}

impl KeyFields {
    /// Bodies dumps, and CSVs derived from them
    pub const BODIES: KeyFields = KeyFields {
        id: "systemId",
        id64: "systemId64",
        name: "systemName",
    };

    /// Systems-with-coordinates dumps
    pub const SYSTEMS: KeyFields = KeyFields {
        id: "id",
        id64: "id64",
        name: "name",
    };
}

/// The bounded set of identifiers a build pass keeps
#[derive(Debug, Clone, Default)]
pub struct NeededKeys {
    ids: HashSet<i64>,
    id64s: HashSet<u64>,
    names: HashSet<String>,
}

impl NeededKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: JoinKey) -> bool {
        match key {
            JoinKey::ById(v) => self.ids.insert(v),
            JoinKey::ById64(v) => self.id64s.insert(v),
            JoinKey::ByName(n) => self.names.insert(n),
        }
    }

    pub fn contains(&self, key: &JoinKey) -> bool {
        match key {
            JoinKey::ById(v) => self.ids.contains(v),
            JoinKey::ById64(v) => self.id64s.contains(v),
            JoinKey::ByName(n) => self.names.contains(n),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len() + self.id64s.len() + self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<JoinKey> for NeededKeys {
    fn from_iter<I: IntoIterator<Item = JoinKey>>(iter: I) -> Self {
        let mut needed = NeededKeys::new();
        for key in iter {
            needed.insert(key);
        }
        needed
    }
}

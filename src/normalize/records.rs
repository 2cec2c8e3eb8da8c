use crate::error::FieldError;
use crate::normalize::coerce::{as_float, FieldExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Conversion from one decoded array element into a typed record
pub trait FromRaw: Sized {
    fn from_raw(raw: &Map<String, Value>) -> Result<Self, FieldError>;
}

/// Galactic coordinates in light years, Sol at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coords {
    pub const SOL: Coords = Coords { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Coords { x, y, z }
    }

    pub fn distance_to(&self, other: &Coords) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn distance_to_sol(&self) -> f64 {
        self.distance_to(&Coords::SOL)
    }

    /// Read coordinates from `{"x": .., "y": .., "z": ..}` or `[x, y, z]`.
    ///
    /// Components may be numbers or numeric strings.
    pub fn from_value(value: Option<&Value>) -> Result<Coords, FieldError> {
        const AXES: [&str; 3] = ["coords.x", "coords.y", "coords.z"];

        let component = |i: usize, v: Option<&Value>| -> Result<f64, FieldError> {
            match v {
                None | Some(Value::Null) => Err(FieldError::missing(AXES[i])),
                Some(v) => as_float(v).ok_or_else(|| FieldError::unparseable(AXES[i])),
            }
        };

        match value {
            None | Some(Value::Null) => Err(FieldError::missing("coords")),
            Some(Value::Object(obj)) => Ok(Coords {
                x: component(0, obj.get("x"))?,
                y: component(1, obj.get("y"))?,
                z: component(2, obj.get("z"))?,
            }),
            Some(Value::Array(arr)) if arr.len() == 3 => Ok(Coords {
                x: component(0, arr.first())?,
                y: component(1, arr.get(1))?,
                z: component(2, arr.get(2))?,
            }),
            Some(_) => Err(FieldError::unparseable("coords")),
        }
    }
}

/// One entry of a systems-with-coordinates dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemRecord {
    pub name: Option<String>,
    pub id: Option<i64>,
    pub id64: Option<u64>,
    pub date: Option<String>,
    pub coords: Coords,
}

impl FromRaw for SystemRecord {
    fn from_raw(raw: &Map<String, Value>) -> Result<Self, FieldError> {
        Ok(SystemRecord {
            name: raw.text("name"),
            id: raw.int("id"),
            id64: raw.uint("id64"),
            date: raw.text("date"),
            coords: Coords::from_value(raw.get("coords"))?,
        })
    }
}

/// One entry of a bodies dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyRecord {
    pub system_id: Option<i64>,
    pub system_id64: Option<u64>,
    pub system_name: Option<String>,
    pub name: Option<String>,
    pub body_type: String,
    pub sub_type: Option<String>,
    pub distance_to_arrival: Option<f64>,
    pub is_main_star: bool,
    pub id64: Option<u64>,
    pub update_time: Option<String>,
}

impl BodyRecord {
    pub fn is_star(&self) -> bool {
        self.body_type == "Star"
    }
}

impl FromRaw for BodyRecord {
    fn from_raw(raw: &Map<String, Value>) -> Result<Self, FieldError> {
        let body_type = raw.text("type").ok_or_else(|| FieldError::missing("type"))?;

        Ok(BodyRecord {
            system_id: raw.int("systemId"),
            system_id64: raw.uint("systemId64"),
            system_name: raw.text("systemName"),
            name: raw.text("name"),
            body_type,
            sub_type: raw.text("subType"),
            distance_to_arrival: raw.float("distanceToArrival"),
            is_main_star: raw.flag("isMainStar").unwrap_or(false),
            id64: raw.uint("id64"),
            update_time: raw.text("updateTime"),
        })
    }
}

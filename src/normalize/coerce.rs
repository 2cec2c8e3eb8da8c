//! Permissive scalar coercion for loosely typed catalog fields.
//!
//! Catalog versions disagree on whether numbers are JSON numbers or numeric
//! strings, so every helper accepts both and returns `None` rather than
//! failing.

use serde_json::{Map, Value};

/// Integer from a JSON number or numeric string.
///
/// Integer parsing is tried first; otherwise the value is read as a float and
/// truncated toward zero. Non-finite and out-of-range floats give `None`.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_to_int)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
        }
        _ => None,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

/// Unsigned integer from a JSON number or numeric string.
///
/// Used for 64-bit catalog addresses, which use the full `u64` range. Same
/// fallback order as [`as_int`]; negative values give `None`.
pub fn as_uint(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(float_to_uint)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_uint))
        }
        _ => None,
    }
}

fn float_to_uint(f: f64) -> Option<u64> {
    // u64::MAX as f64 rounds up to 2^64
    if f.is_finite() && f > -1.0 && f < u64::MAX as f64 {
        Some(f.trunc() as u64)
    } else {
        None
    }
}

/// Finite float from a JSON number or numeric string
pub fn as_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Trimmed, non-empty text. Numbers and booleans are rendered as text.
pub fn as_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Boolean from a JSON bool, a number, or `"true"`/`"false"`/`"1"`/`"0"`
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Field lookups that treat JSON `null` like an absent key
pub trait FieldExt {
    fn field(&self, key: &str) -> Option<&Value>;

    fn int(&self, key: &str) -> Option<i64> {
        self.field(key).and_then(as_int)
    }

    fn uint(&self, key: &str) -> Option<u64> {
        self.field(key).and_then(as_uint)
    }

    fn float(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(as_float)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.field(key).and_then(as_text)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(as_flag)
    }

    /// First of `keys` holding non-empty text
    fn first_nonempty(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }
}

impl FieldExt for Map<String, Value> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|v| !v.is_null())
    }
}

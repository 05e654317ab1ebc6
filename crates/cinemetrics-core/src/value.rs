//! Cell values for the in-memory table model

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;

/// A single table cell
///
/// `Float(NaN)` is treated as null everywhere, so arithmetic that produces
/// NaN never leaks a "real" value into the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value
    Null,

    /// Boolean flag (derived columns only)
    Bool(bool),

    /// Integer (identifiers)
    Int(i64),

    /// Floating point measurement
    Float(f64),

    /// Text
    Text(String),

    /// Calendar date
    Date(NaiveDate),

    /// Nested structure not yet flattened
    Json(serde_json::Value),
}

impl Value {
    /// Convert a raw JSON value into a cell, keeping nested structures intact
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    n.as_f64().map(Self::Float).unwrap_or(Self::Null)
                }
            }
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Json(other.clone()),
        }
    }

    /// Build a float cell, mapping non-finite results to null
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Null
        }
    }

    /// Build a float cell from an optional value
    pub fn from_opt_f64(value: Option<f64>) -> Self {
        value.map(Self::float).unwrap_or(Self::Null)
    }

    /// Whether the cell counts as missing
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view (integers widen to float)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Integer view (integral floats narrow to integers)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Ordering between two non-null cells
    ///
    /// Numbers compare numerically across `Int`/`Float`; cells of unrelated
    /// kinds fall back to a fixed kind rank so the order stays total.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }

        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Date(_) => 3,
            Self::Text(_) => 4,
            Self::Json(_) => 5,
        }
    }
}

/// Format a float with full round-trip precision
///
/// Integral values keep a trailing `.0` so the column stays recognizably
/// floating point once written to text.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) if v.is_nan() => Ok(()),
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::Text(s) => write!(f, "{}", s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Json(j) => write!(f, "{}", j),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

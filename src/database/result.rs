//! Row data returned by a live connection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row data as a map of column name to value.
pub type Row = BTreeMap<String, CellValue>;

/// Cell value that can hold different SQL types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<()> for CellValue {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

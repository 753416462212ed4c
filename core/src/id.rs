//! Identity types for Tether records.
//!
//! Record keys are 64-bit values that are:
//! - Unique within their record type
//! - Immutable once assigned
//! - Either allocated by the store or supplied by the caller

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Value;

/// Primary key of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new RecordId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Interpret a value as a key.
    ///
    /// Accepts non-negative integers, numeric strings and record references.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) if *i >= 0 => Some(Self(*i as u64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse::<u64>().map(Self)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A typed reference to a record: the type name plus its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    /// Name of the record type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Primary key.
    pub key: RecordId,
}

impl RecordRef {
    pub fn new(type_name: impl Into<String>, key: impl Into<RecordId>) -> Self {
        Self {
            type_name: type_name.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.type_name, self.key)
    }
}

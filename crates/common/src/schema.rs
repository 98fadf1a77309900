//! Logical column model shared by the planner and the reader.

use serde::{Deserialize, Serialize};

/// Declared logical type of a source column.
///
/// The first seven variants can be materialized into in-memory arrays. The
/// remaining variants exist so a source schema can describe columns this
/// reader cannot decode; referencing one in a scan fails planning with an
/// aggregated [`crate::SqfError::UnsupportedColumnTypes`] report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Int64,
    Float64,
    Boolean,
    Utf8,
    Date,
    Timestamp,
    /// Utf8 stored dictionary-encoded in memory to reduce footprint.
    DictionaryUtf8,
    Binary,
    Decimal,
    Interval,
}

impl LogicalType {
    /// Whether the reader can decode backend rows of this type into an array.
    pub fn is_materializable(&self) -> bool {
        !matches!(
            self,
            LogicalType::Binary | LogicalType::Decimal | LogicalType::Interval
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LogicalType::Int64 => "Int64",
            LogicalType::Float64 => "Float64",
            LogicalType::Boolean => "Boolean",
            LogicalType::Utf8 => "Utf8",
            LogicalType::Date => "Date",
            LogicalType::Timestamp => "Timestamp",
            LogicalType::DictionaryUtf8 => "DictionaryUtf8",
            LogicalType::Binary => "Binary",
            LogicalType::Decimal => "Decimal",
            LogicalType::Interval => "Interval",
        }
    }
}

/// A named, typed source column. Immutable once a scan plan is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, logical_type: LogicalType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable,
        }
    }
}

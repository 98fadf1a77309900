//! Backend dialect tags shared across planner and reader components.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SqfError;

/// Closed set of supported SQL backends.
///
/// Dialect-specific behavior (quoting, pagination, literal formatting) is
/// dispatched through a trait keyed by this tag; there is no open registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectId {
    Generic,
    MySql,
    Oracle,
    Snowflake,
}

impl DialectId {
    pub const ALL: [DialectId; 4] = [
        DialectId::Generic,
        DialectId::MySql,
        DialectId::Oracle,
        DialectId::Snowflake,
    ];

    /// Canonical lowercase name used in configuration and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectId::Generic => "generic",
            DialectId::MySql => "mysql",
            DialectId::Oracle => "oracle",
            DialectId::Snowflake => "snowflake",
        }
    }
}

impl fmt::Display for DialectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectId {
    type Err = SqfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(DialectId::Generic),
            "mysql" => Ok(DialectId::MySql),
            "oracle" => Ok(DialectId::Oracle),
            "snowflake" => Ok(DialectId::Snowflake),
            other => Err(SqfError::Planning(format!(
                "unknown backend dialect: {other} (expected one of generic|mysql|oracle|snowflake)"
            ))),
        }
    }
}

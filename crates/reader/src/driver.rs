//! Backend driver boundary.
//!
//! The reader prescribes nothing beyond "executes a SQL string, returns
//! typed rows". Connection lifecycle, authentication, and pooling live with
//! the driver implementation; every worker owns its own driver connection
//! end to end.

use chrono::{NaiveDate, NaiveDateTime};
use sqf_common::Result;

/// One backend-native value. `None` in a [`Row`] slot is a backend NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// One fetched row; slot order matches the projected column order.
pub type Row = Vec<Option<Cell>>;

/// Executes SQL text against one backend connection.
///
/// Must support `SELECT COUNT(*) FROM (q) x` over any query it accepts.
/// Failures are surfaced verbatim as
/// [`sqf_common::SqfError::BackendExecution`]; the reader never interprets
/// or retries them.
pub trait BackendDriver: Send + Sync {
    fn execute(&self, sql: &str) -> Result<Vec<Row>>;
}

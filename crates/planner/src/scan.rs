//! Declarative table-scan request and the pushdown filter model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqf_common::{Column, DialectId, ReaderConfig};
use sqf_dialect::Literal;

/// Comparison operator usable in a pushed-down predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "IN",
        }
    }
}

/// Right-hand side of a comparison: an inline literal, or a named binding
/// resolved from a caller-supplied map at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Literal(Literal),
    ColumnRef(String),
}

/// One column comparison inside an AND group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub column: Column,
    pub op: CompareOp,
    pub value: FilterValue,
}

/// A disjunction of conjunctions: `OR [ AND [ Comparison... ] ... ]`.
///
/// Every referenced column must exist in the source schema; it does not have
/// to appear in the requested output columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterTree {
    pub groups: Vec<Vec<Comparison>>,
}

impl FilterTree {
    /// All columns referenced anywhere in the tree, in appearance order.
    pub fn columns(&self) -> Vec<&Column> {
        self.groups
            .iter()
            .flat_map(|g| g.iter().map(|c| &c.column))
            .collect()
    }
}

/// A declarative table-scan request.
///
/// Invariant: `requested_columns` is non-empty unless `index_column` is set
/// (a pure index read). Owned by the caller and passed by reference into the
/// reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Base query whose result set is scanned. Never re-parsed or validated.
    pub base_query: String,
    pub backend: DialectId,
    /// Columns that must appear in the output, order-preserving.
    pub requested_columns: Vec<Column>,
    /// Column split out of the result into a separate index array.
    pub index_column: Option<Column>,
    pub filters: Option<FilterTree>,
    /// Cap on total rows fetched across all workers.
    pub row_limit: Option<u64>,
    /// Number of parallel workers; must be positive.
    pub parallelism: u32,
    /// Identifiers that required case normalization at ingestion time;
    /// upper-cased again when quoting for Oracle/Snowflake.
    pub case_normalized: BTreeSet<String>,
}

impl ScanRequest {
    /// Starts a request from the recognized per-read configuration surface
    /// (backend, parallelism, row limit). Columns, filters, and the index
    /// are filled in by the caller.
    pub fn with_config(base_query: impl Into<String>, config: &ReaderConfig) -> Self {
        Self {
            base_query: base_query.into(),
            backend: config.backend,
            requested_columns: Vec::new(),
            index_column: None,
            filters: None,
            row_limit: config.row_limit,
            parallelism: config.parallelism,
            case_normalized: BTreeSet::new(),
        }
    }
}

/// Detects a trailing `LIMIT <n>` on the base query text.
///
/// An explicit request limit and a query-text limit reconcile to the smaller
/// row budget; see [`effective_row_limit`].
pub fn detect_trailing_limit(base_query: &str) -> Option<u64> {
    let mut tokens = base_query.split_whitespace().rev();
    let count = tokens.next()?;
    let keyword = tokens.next()?;
    if !keyword.eq_ignore_ascii_case("limit") {
        return None;
    }
    count.parse::<u64>().ok()
}

/// The effective row budget for a request: the smaller of the explicit
/// `row_limit` and any trailing `LIMIT` already present in the base query.
pub fn effective_row_limit(request: &ScanRequest) -> Option<u64> {
    match (request.row_limit, detect_trailing_limit(&request.base_query)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

//! Scan planning: request model, column pruning, and filter pushdown.
//!
//! Architecture role:
//! - defines the declarative [`ScanRequest`] and pushdown [`FilterTree`]
//! - reduces a request to a minimal [`ProjectedScan`]
//! - compiles the predicate tree into a `WHERE` clause fragment
//!
//! Key modules:
//! - [`scan`]
//! - [`prune`]
//! - [`filter`]

pub mod filter;
pub mod prune;
pub mod scan;

pub use filter::compile_filters;
pub use prune::{plan_scan, ProjectedScan};
pub use scan::{
    detect_trailing_limit, effective_row_limit, CompareOp, Comparison, FilterTree, FilterValue,
    ScanRequest,
};

//! Column pruning: computes the minimal projected column set, the projected
//! query text, and per-column dictionary-encoding hints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqf_common::{Column, LogicalType, Result, SqfError, UnsupportedColumn};
use sqf_dialect::dialect_for;

use crate::scan::ScanRequest;

/// The reduced scan derived from a [`ScanRequest`].
///
/// Created once per request, consumed immediately by partitioning, then
/// discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedScan {
    /// Projection-wrapped query text; the pushed-down `WHERE` fragment is
    /// appended to this later.
    pub final_query_text: String,
    /// Output columns in materialization order: requested columns first
    /// (caller order preserved), then the index column last if it was not
    /// already requested. Downstream slices results positionally, so this
    /// order is load-bearing.
    pub output_columns: Vec<Column>,
    /// Names of output columns that should be dictionary-encoded in memory.
    /// Static, type-driven classification; never a cardinality measurement.
    pub dictionary_candidates: BTreeSet<String>,
}

/// Reduces `request` to the minimal projected scan.
///
/// The used set is the union of the requested columns, every column
/// referenced in the filter tree, and the index column. Filter columns are
/// validated against `source_schema` but do not join the output. All
/// unmaterializable used columns are collected into a single
/// [`SqfError::UnsupportedColumnTypes`] report.
pub fn plan_scan(request: &ScanRequest, source_schema: &[Column]) -> Result<ProjectedScan> {
    if request.requested_columns.is_empty() && request.index_column.is_none() {
        return Err(SqfError::Planning(
            "scan requests no columns and no index; nothing to read".to_string(),
        ));
    }

    let mut used: Vec<&Column> = request.requested_columns.iter().collect();
    if let Some(filters) = &request.filters {
        for column in filters.columns() {
            if !source_schema.iter().any(|c| c.name == column.name) {
                return Err(SqfError::Planning(format!(
                    "filter references column '{}' absent from the source schema",
                    column.name
                )));
            }
            used.push(column);
        }
    }
    if let Some(index) = &request.index_column {
        used.push(index);
    }

    let mut offenders: Vec<UnsupportedColumn> = Vec::new();
    for column in &used {
        if !column.logical_type.is_materializable()
            && !offenders.iter().any(|o| o.name == column.name)
        {
            offenders.push(UnsupportedColumn {
                name: column.name.clone(),
                type_name: column.logical_type.type_name().to_string(),
            });
        }
    }
    if !offenders.is_empty() {
        return Err(SqfError::UnsupportedColumnTypes(offenders));
    }

    let mut output_columns = request.requested_columns.clone();
    if let Some(index) = &request.index_column {
        if !output_columns.iter().any(|c| c.name == index.name) {
            output_columns.push(index.clone());
        }
    }

    let dictionary_candidates = output_columns
        .iter()
        .filter(|c| c.logical_type == LogicalType::Utf8)
        .map(|c| c.name.clone())
        .collect::<BTreeSet<_>>();

    let dialect = dialect_for(request.backend);
    let names: Vec<String> = output_columns.iter().map(|c| c.name.clone()).collect();
    let projected = dialect.quote_identifiers(&names, &request.case_normalized);
    let final_query_text = dialect.wrap_projection(&request.base_query, &projected);

    Ok(ProjectedScan {
        final_query_text,
        output_columns,
        dictionary_candidates,
    })
}

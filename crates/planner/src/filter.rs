//! Filter pushdown: rewrites the pushed-down predicate tree into a `WHERE`
//! clause fragment appended verbatim to the caller's base query.

use std::collections::HashMap;

use sqf_common::{DialectId, Result, SqfError};
use sqf_dialect::{serialize, Literal};

use crate::scan::{CompareOp, Comparison, FilterTree, FilterValue};

/// Compiles `filters` into a `" WHERE ..."` fragment, or `None` when there is
/// nothing to push down.
///
/// Each AND group renders as `( c1 op v1 AND c2 op v2 ... )`; groups join
/// with `OR`. `ColumnRef` values resolve through `bindings` instead of being
/// serialized as literals. An empty conjunction group fails planning, since
/// it cannot render as valid SQL. The fragment is appended to the base query
/// without re-parsing it; a malformed combination surfaces as a backend
/// error.
pub fn compile_filters(
    filters: Option<&FilterTree>,
    backend: DialectId,
    bindings: &HashMap<String, String>,
) -> Result<Option<String>> {
    let Some(tree) = filters else {
        return Ok(None);
    };
    if tree.groups.is_empty() {
        return Ok(None);
    }

    let mut groups = Vec::with_capacity(tree.groups.len());
    for group in &tree.groups {
        if group.is_empty() {
            return Err(SqfError::Planning(
                "empty conjunction group in filter tree".to_string(),
            ));
        }
        let comparisons = group
            .iter()
            .map(|c| render_comparison(c, backend, bindings))
            .collect::<Result<Vec<_>>>()?;
        groups.push(format!("( {} )", comparisons.join(" AND ")));
    }
    Ok(Some(format!(" WHERE {}", groups.join(" OR "))))
}

fn render_comparison(
    comparison: &Comparison,
    backend: DialectId,
    bindings: &HashMap<String, String>,
) -> Result<String> {
    let value = match &comparison.value {
        FilterValue::Literal(lit) => {
            if comparison.op == CompareOp::In && !matches!(lit, Literal::List(_)) {
                return Err(SqfError::Planning(format!(
                    "IN filter on column '{}' requires a list value",
                    comparison.column.name
                )));
            }
            serialize(lit, backend)?
        }
        FilterValue::ColumnRef(binding) => bindings
            .get(binding)
            .cloned()
            .ok_or_else(|| {
                SqfError::Planning(format!(
                    "filter on column '{}' references unbound value '{}'",
                    comparison.column.name, binding
                ))
            })?,
    };
    Ok(format!(
        "{} {} {}",
        comparison.column.name,
        comparison.op.sql(),
        value
    ))
}

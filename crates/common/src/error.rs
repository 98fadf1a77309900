use thiserror::Error;

/// A column that the reader cannot materialize, paired with the offending
/// declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedColumn {
    pub name: String,
    pub type_name: String,
}

fn render_unsupported(columns: &[UnsupportedColumn]) -> String {
    let list = columns
        .iter()
        .map(|c| format!("column '{}' with unsupported type {}", c.name, c.type_name))
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "{list}. Remove these columns from the scan by selecting only the columns you need, \
         or convert them to a supported type in the source."
    )
}

/// Canonical error taxonomy for the partitioned table reader.
///
/// Classification guidance:
/// - [`SqfError::MissingDependency`]: backend client capability absent, raised before any I/O
/// - [`SqfError::Planning`]: request-shape violations discovered before execution
/// - [`SqfError::UnsupportedColumnTypes`]: one aggregated report of every unmaterializable column
/// - [`SqfError::BackendExecution`]: driver rejected or failed the generated query, surfaced verbatim
/// - [`SqfError::Execution`]: decode/shape failures while materializing fetched rows
/// - [`SqfError::PartitionCountMismatch`]: internal row-range invariant violation, a defect
#[derive(Debug, Error)]
pub enum SqfError {
    /// Required backend client capability is not installed.
    ///
    /// Raised by the connectivity precondition check ahead of every other
    /// step; never retried, never downgraded to a different backend.
    #[error("missing client dependency for {backend}: {capability} is not available. {hint}")]
    MissingDependency {
        backend: String,
        capability: String,
        hint: String,
    },

    /// Invalid or inconsistent scan request.
    ///
    /// Examples:
    /// - filter referencing a column absent from the source schema
    /// - empty projection with no index column
    /// - zero parallelism, or rank/world-size disagreement
    #[error("planning error: {0}")]
    Planning(String),

    /// One or more requested/filter/index columns cannot be materialized.
    ///
    /// Offenders are collected and reported together in a single error.
    #[error("unsupported column types: {}", render_unsupported(.0))]
    UnsupportedColumnTypes(Vec<UnsupportedColumn>),

    /// Literal value outside the serializable union (heterogeneous or nested
    /// list). Unreachable for a well-formed filter tree.
    #[error("unsupported literal type in filter pushdown: {0}")]
    UnsupportedLiteral(String),

    /// The backend driver rejected or failed the generated query. The driver
    /// message is carried verbatim; nothing is interpreted or retried here.
    #[error("backend execution failed: {0}")]
    BackendExecution(String),

    /// Row decode or data-shape failure after the backend returned rows.
    #[error("execution error: {0}")]
    Execution(String),

    /// Broadcast row count or partition split produced overlapping or gapped
    /// ranges. Never expected in correct operation.
    #[error("partition invariant violated: {0}")]
    PartitionCountMismatch(String),
}

/// Standard result alias used across the reader crates.
pub type Result<T> = std::result::Result<T, SqfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_columns_report_every_offender_in_one_message() {
        let err = SqfError::UnsupportedColumnTypes(vec![
            UnsupportedColumn {
                name: "blob".to_string(),
                type_name: "Binary".to_string(),
            },
            UnsupportedColumn {
                name: "price".to_string(),
                type_name: "Decimal".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("column 'blob' with unsupported type Binary"), "msg={msg}");
        assert!(msg.contains("column 'price' with unsupported type Decimal"), "msg={msg}");
    }

    #[test]
    fn missing_dependency_names_capability_and_hint() {
        let err = SqfError::MissingDependency {
            backend: "snowflake".to_string(),
            capability: "snowflake-connector".to_string(),
            hint: "install it".to_string(),
        };
        assert!(err.to_string().contains("snowflake-connector"));
    }
}

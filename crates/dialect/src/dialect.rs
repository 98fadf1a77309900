//! Per-backend syntax rules for identifier quoting, pagination, and
//! projection wrapping.

use std::collections::BTreeSet;

use sqf_common::DialectId;

/// Syntax variant of one SQL backend.
///
/// Implementations are stateless; [`dialect_for`] resolves the tag to a
/// static instance at call time.
pub trait Dialect: Send + Sync {
    /// Joins `names` into a comma-separated, dialect-quoted identifier list.
    ///
    /// `case_normalized` holds identifiers that required case normalization
    /// at ingestion time; backends that fold unquoted identifiers to upper
    /// case (Oracle, Snowflake) restore those to upper case before quoting.
    fn quote_identifiers(&self, names: &[String], case_normalized: &BTreeSet<String>) -> String;

    /// Wraps `inner` so only the rows `[offset, offset + limit)` are fetched.
    fn paginate(&self, inner: &str, offset: u64, limit: u64) -> String;

    /// Wraps `inner` so only `projected` (an already-quoted identifier list)
    /// is selected.
    fn wrap_projection(&self, inner: &str, projected: &str) -> String;
}

fn double_quote(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn upper_case_normalized(names: &[String], case_normalized: &BTreeSet<String>) -> Vec<String> {
    names
        .iter()
        .map(|n| {
            if case_normalized.contains(n) {
                n.to_uppercase()
            } else {
                n.clone()
            }
        })
        .collect()
}

fn limit_offset(inner: &str, offset: u64, limit: u64) -> String {
    format!("SELECT * FROM ({inner}) x LIMIT {limit} OFFSET {offset}")
}

fn wrap_as_temp(inner: &str, projected: &str) -> String {
    format!("SELECT {projected} FROM ({inner}) AS TEMP")
}

struct GenericDialect;

impl Dialect for GenericDialect {
    fn quote_identifiers(&self, names: &[String], _case_normalized: &BTreeSet<String>) -> String {
        double_quote(names)
    }

    fn paginate(&self, inner: &str, offset: u64, limit: u64) -> String {
        limit_offset(inner, offset, limit)
    }

    fn wrap_projection(&self, inner: &str, projected: &str) -> String {
        wrap_as_temp(inner, projected)
    }
}

struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn quote_identifiers(&self, names: &[String], _case_normalized: &BTreeSet<String>) -> String {
        names
            .iter()
            .map(|n| format!("`{n}`"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn paginate(&self, inner: &str, offset: u64, limit: u64) -> String {
        limit_offset(inner, offset, limit)
    }

    fn wrap_projection(&self, inner: &str, projected: &str) -> String {
        wrap_as_temp(inner, projected)
    }
}

struct OracleDialect;

impl Dialect for OracleDialect {
    fn quote_identifiers(&self, names: &[String], case_normalized: &BTreeSet<String>) -> String {
        double_quote(&upper_case_normalized(names, case_normalized))
    }

    fn paginate(&self, inner: &str, offset: u64, limit: u64) -> String {
        format!("SELECT * FROM ({inner}) OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY")
    }

    // Oracle rejects the AS keyword on table aliases.
    fn wrap_projection(&self, inner: &str, projected: &str) -> String {
        format!("SELECT {projected} FROM ({inner}) TEMP")
    }
}

struct SnowflakeDialect;

impl Dialect for SnowflakeDialect {
    fn quote_identifiers(&self, names: &[String], case_normalized: &BTreeSet<String>) -> String {
        double_quote(&upper_case_normalized(names, case_normalized))
    }

    fn paginate(&self, inner: &str, offset: u64, limit: u64) -> String {
        limit_offset(inner, offset, limit)
    }

    fn wrap_projection(&self, inner: &str, projected: &str) -> String {
        wrap_as_temp(inner, projected)
    }
}

/// Resolves a dialect tag to its syntax rules.
pub fn dialect_for(id: DialectId) -> &'static dyn Dialect {
    match id {
        DialectId::Generic => &GenericDialect,
        DialectId::MySql => &MySqlDialect,
        DialectId::Oracle => &OracleDialect,
        DialectId::Snowflake => &SnowflakeDialect,
    }
}

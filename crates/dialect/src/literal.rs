//! Typed scalar/list values rendered as dialect-safe SQL literal text.

use std::mem::discriminant;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use sqf_common::{DialectId, Result, SqfError};

/// A typed filter value that can be pushed down as SQL literal text.
///
/// Invariant: a `List` holds homogeneous scalar elements; nested lists are
/// rejected at serialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<Literal>),
}

/// Renders `literal` as SQL text safe to embed in a query for `dialect`.
///
/// Total over the union; the only failure is the defensive invariant check
/// on malformed lists, which a well-typed filter tree never produces.
pub fn serialize(literal: &Literal, dialect: DialectId) -> Result<String> {
    match literal {
        Literal::Int(v) => Ok(v.to_string()),
        Literal::Float(v) => Ok(v.to_string()),
        Literal::Bool(v) => Ok(v.to_string()),
        Literal::Str(s) => Ok(quote_string(s, dialect)),
        Literal::Date(d) => Ok(format!("date '{}'", d.format("%Y-%m-%d"))),
        // Fixed 9-digit fraction so lexical and chronological order agree.
        Literal::Timestamp(ts) => Ok(format!(
            "timestamp '{}.{:09}'",
            ts.format("%Y-%m-%d %H:%M:%S"),
            ts.nanosecond()
        )),
        Literal::List(elems) => serialize_list(elems, dialect),
    }
}

fn quote_string(s: &str, dialect: DialectId) -> String {
    match dialect {
        // $$ delimiters sidestep escaping of embedded quote characters.
        DialectId::Snowflake => format!("$${s}$$"),
        _ => format!("'{}'", s.replace('\'', "''")),
    }
}

fn serialize_list(elems: &[Literal], dialect: DialectId) -> Result<String> {
    if let Some(first) = elems.first() {
        if matches!(first, Literal::List(_)) {
            return Err(SqfError::UnsupportedLiteral(
                "nested list in filter value".to_string(),
            ));
        }
        let tag = discriminant(first);
        if elems.iter().any(|e| discriminant(e) != tag) {
            return Err(SqfError::UnsupportedLiteral(
                "heterogeneous list in filter value".to_string(),
            ));
        }
    }
    let parts = elems
        .iter()
        .map(|e| serialize(e, dialect))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(", ")))
}

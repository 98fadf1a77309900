//! Dialect adapters and literal serialization for SQL backends.
//!
//! Architecture role:
//! - per-backend identifier quoting, pagination, and projection wrapping
//! - typed literal values rendered as dialect-safe SQL text
//!
//! Key modules:
//! - [`dialect`]
//! - [`literal`]

pub mod dialect;
pub mod literal;

pub use dialect::{dialect_for, Dialect};
pub use literal::{serialize, Literal};

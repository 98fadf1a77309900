//! Shared configuration, error types, dialect tags, and schema model for the
//! sqlfetch crates.
//!
//! Architecture role:
//! - defines the per-read configuration passed across layers
//! - provides common [`SqfError`] / [`Result`] contracts
//! - hosts the backend dialect tag and the logical column model
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`schema`]

pub mod config;
pub mod error;
pub mod ids;
pub mod schema;

pub use config::ReaderConfig;
pub use error::{Result, SqfError, UnsupportedColumn};
pub use ids::DialectId;
pub use schema::{Column, LogicalType};

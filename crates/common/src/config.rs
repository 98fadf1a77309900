use serde::{Deserialize, Serialize};

use crate::ids::DialectId;

/// Per-read configuration surface recognized by the table reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Target backend dialect.
    pub backend: DialectId,
    /// Number of parallel workers; must be positive.
    pub parallelism: u32,
    /// Optional cap on the total rows fetched across all workers.
    pub row_limit: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            backend: DialectId::Generic,
            parallelism: 1,
            row_limit: None,
        }
    }
}

//! Distributed, query-pushdown table reading over partitioned row ranges.
//!
//! Architecture role:
//! - verifies backend client capabilities before any network I/O
//! - partitions the scanned row range across independent workers
//! - executes the per-partition fetch and decodes rows into Arrow arrays
//!
//! Key modules:
//! - [`precheck`]
//! - [`context`]
//! - [`partition`]
//! - [`driver`]
//! - [`materialize`]
//! - [`reader`]

pub mod context;
pub mod driver;
pub mod materialize;
pub mod partition;
pub mod precheck;
pub mod reader;

pub use context::{LocalBroadcast, ScalarBroadcast, WorkerContext};
pub use driver::{BackendDriver, Cell, Row};
pub use materialize::TableMaterialization;
pub use partition::{partition_for_rank, partition_rows, Partition};
pub use precheck::{client_requirement, verify_client, CapabilityProbe, StaticProbe};
pub use reader::DistributedTableReader;

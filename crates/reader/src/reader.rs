//! Root orchestration: turns a [`ScanRequest`] into this worker's typed
//! table slice.
//!
//! Per read, each worker performs exactly one data round-trip for its own
//! row range; the row count costs one extra round-trip shared by all workers
//! through the rank-0 broadcast. Nothing is retried and nothing is shared
//! between workers beyond that single scalar.

use std::collections::HashMap;
use std::sync::Arc;

use sqf_common::{Column, Result, SqfError};
use sqf_dialect::dialect_for;
use sqf_planner::{compile_filters, effective_row_limit, plan_scan, ScanRequest};
use tracing::debug;

use crate::context::WorkerContext;
use crate::driver::{BackendDriver, Cell};
use crate::materialize::{materialize, TableMaterialization};
use crate::partition::partition_for_rank;
use crate::precheck::{verify_client, CapabilityProbe};

/// Stateless-per-call distributed table reader.
pub struct DistributedTableReader {
    driver: Arc<dyn BackendDriver>,
    probe: Arc<dyn CapabilityProbe>,
}

impl DistributedTableReader {
    pub fn new(driver: Arc<dyn BackendDriver>, probe: Arc<dyn CapabilityProbe>) -> Self {
        Self { driver, probe }
    }

    /// Fetches this worker's partition of the scan and materializes it.
    ///
    /// `bindings` resolves `ColumnRef` filter values to pre-rendered SQL
    /// text. Errors follow the taxonomy in `sqf_common`; none are retried or
    /// swallowed here.
    pub fn read(
        &self,
        request: &ScanRequest,
        source_schema: &[Column],
        bindings: &HashMap<String, String>,
        ctx: &WorkerContext,
    ) -> Result<TableMaterialization> {
        verify_client(request.backend, self.probe.as_ref())?;

        if ctx.world_size != request.parallelism {
            return Err(SqfError::Planning(format!(
                "request parallelism {} does not match worker world size {}",
                request.parallelism, ctx.world_size
            )));
        }

        let plan = plan_scan(request, source_schema)?;
        let loaded: Vec<&str> = plan.output_columns.iter().map(|c| c.name.as_str()).collect();
        debug!(columns = ?loaded, "finished column pruning on scan");
        if !plan.dictionary_candidates.is_empty() {
            debug!(
                columns = ?plan.dictionary_candidates,
                "using dictionary encoding to reduce memory usage"
            );
        }

        let mut query = plan.final_query_text.clone();
        if let Some(fragment) = compile_filters(request.filters.as_ref(), request.backend, bindings)?
        {
            query.push_str(&fragment);
        }

        let source_rows = self.broadcast_row_count(&query, ctx)?;
        let total_rows = match effective_row_limit(request) {
            Some(limit) => limit.min(source_rows),
            None => source_rows,
        };

        let partition = partition_for_rank(total_rows, request.parallelism, ctx.rank)?;
        let dialect = dialect_for(request.backend);
        let fetch_query = dialect.paginate(&query, partition.offset, partition.count);
        debug!(
            rank = ctx.rank,
            offset = partition.offset,
            count = partition.count,
            "fetching partition"
        );
        let rows = self.driver.execute(&fetch_query)?;
        if rows.len() as u64 > partition.count {
            return Err(SqfError::PartitionCountMismatch(format!(
                "backend returned {} rows for a {}-row range",
                rows.len(),
                partition.count
            )));
        }

        let index_name = request.index_column.as_ref().map(|c| c.name.as_str());
        let keep_index = match index_name {
            Some(name) => request.requested_columns.iter().any(|c| c.name == name),
            None => false,
        };
        materialize(
            &rows,
            &plan.output_columns,
            &plan.dictionary_candidates,
            index_name,
            keep_index,
        )
    }

    /// Rank 0 issues `SELECT COUNT(*) FROM (q) x` once; every other rank
    /// blocks on the broadcast scalar. This is the only cross-worker
    /// synchronization in the subsystem.
    fn broadcast_row_count(&self, query: &str, ctx: &WorkerContext) -> Result<u64> {
        let counted = if ctx.rank == 0 {
            let count_query = format!("SELECT COUNT(*) FROM ({query}) x");
            let rows = self.driver.execute(&count_query)?;
            let scalar = rows.first().and_then(|r| r.first()).cloned().flatten();
            let count = match scalar {
                Some(Cell::Int(n)) if n >= 0 => n as u64,
                other => {
                    return Err(SqfError::Execution(format!(
                        "count query returned no usable scalar: {other:?}"
                    )))
                }
            };
            Some(count)
        } else {
            None
        };
        ctx.broadcast.broadcast(counted)
    }
}

//! Balanced row-range partitioning for parallel fetch.

use serde::{Deserialize, Serialize};
use sqf_common::{Result, SqfError};

/// A contiguous, disjoint row range assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub offset: u64,
    pub count: u64,
    pub worker_rank: u32,
}

/// Splits `[0, total_rows)` into `parallelism` disjoint ranges.
///
/// Every worker receives `floor(total_rows / parallelism)` rows; the
/// remainder is distributed one row at a time to the first workers, so
/// counts differ by at most 1 and partition 0 starts at offset 0.
pub fn partition_rows(total_rows: u64, parallelism: u32) -> Result<Vec<Partition>> {
    if parallelism == 0 {
        return Err(SqfError::Planning("parallelism must be positive".to_string()));
    }
    let partitions: Vec<Partition> = (0..parallelism)
        .map(|rank| partition_at(total_rows, parallelism, rank))
        .collect();
    verify_coverage(&partitions, total_rows)?;
    Ok(partitions)
}

/// This worker's partition of `[0, total_rows)`.
pub fn partition_for_rank(total_rows: u64, parallelism: u32, rank: u32) -> Result<Partition> {
    if parallelism == 0 {
        return Err(SqfError::Planning("parallelism must be positive".to_string()));
    }
    if rank >= parallelism {
        return Err(SqfError::Planning(format!(
            "worker rank {rank} out of range for parallelism {parallelism}"
        )));
    }
    Ok(partition_at(total_rows, parallelism, rank))
}

fn partition_at(total_rows: u64, parallelism: u32, rank: u32) -> Partition {
    let workers = u64::from(parallelism);
    let rank64 = u64::from(rank);
    let base = total_rows / workers;
    let remainder = total_rows % workers;
    let count = base + u64::from(rank64 < remainder);
    let offset = rank64 * base + rank64.min(remainder);
    Partition {
        offset,
        count,
        worker_rank: rank,
    }
}

fn verify_coverage(partitions: &[Partition], total_rows: u64) -> Result<()> {
    let mut next = 0u64;
    for p in partitions {
        if p.offset != next {
            return Err(SqfError::PartitionCountMismatch(format!(
                "partition {} starts at {} instead of {}",
                p.worker_rank, p.offset, next
            )));
        }
        next = next
            .checked_add(p.count)
            .ok_or_else(|| SqfError::PartitionCountMismatch("row range overflow".to_string()))?;
    }
    if next != total_rows {
        return Err(SqfError::PartitionCountMismatch(format!(
            "partitions cover {next} of {total_rows} rows"
        )));
    }
    Ok(())
}

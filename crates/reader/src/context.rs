//! Worker identity and the one-shot row-count broadcast.
//!
//! Worker rank and world size are carried explicitly in a context struct,
//! never read from process-wide state. The broadcast is the single
//! suspension point in the subsystem: rank 0 publishes one scalar and every
//! other rank blocks until it arrives.

use std::sync::{Arc, Condvar, Mutex};

use sqf_common::{Result, SqfError};

/// One-shot scalar broadcast between the workers of a single read.
pub trait ScalarBroadcast: Send + Sync {
    /// Rank 0 passes `Some(value)` to publish; every other rank passes
    /// `None` and blocks until the value is available. Returns the published
    /// scalar on all ranks.
    fn broadcast(&self, value: Option<u64>) -> Result<u64>;
}

/// In-process broadcast for workers running as threads.
///
/// One-shot: a second publish on the same instance is an invariant
/// violation. Create a fresh instance per read.
#[derive(Debug, Default)]
pub struct LocalBroadcast {
    slot: Mutex<Option<u64>>,
    ready: Condvar,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScalarBroadcast for LocalBroadcast {
    fn broadcast(&self, value: Option<u64>) -> Result<u64> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| SqfError::Execution("broadcast lock poisoned".to_string()))?;
        match value {
            Some(v) => {
                if slot.is_some() {
                    return Err(SqfError::Execution(
                        "row count broadcast published twice".to_string(),
                    ));
                }
                *slot = Some(v);
                self.ready.notify_all();
                Ok(v)
            }
            None => {
                while slot.is_none() {
                    slot = self
                        .ready
                        .wait(slot)
                        .map_err(|_| SqfError::Execution("broadcast lock poisoned".to_string()))?;
                }
                Ok(slot.unwrap_or_default())
            }
        }
    }
}

/// Identity and coordination handle for one worker of one read.
#[derive(Clone)]
pub struct WorkerContext {
    /// This worker's rank in `[0, world_size)`.
    pub rank: u32,
    /// Total number of workers participating in the read.
    pub world_size: u32,
    pub broadcast: Arc<dyn ScalarBroadcast>,
}

impl WorkerContext {
    pub fn new(rank: u32, world_size: u32, broadcast: Arc<dyn ScalarBroadcast>) -> Self {
        Self {
            rank,
            world_size,
            broadcast,
        }
    }

    /// Context for an undistributed read: one worker, rank 0.
    pub fn single() -> Self {
        Self::new(0, 1, Arc::new(LocalBroadcast::new()))
    }
}

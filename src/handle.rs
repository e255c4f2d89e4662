//! Generational handles identifying a checkout

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_pool_id() -> u64 {
    NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identifies one checkout of one pooled instance.
///
/// A handle is only valid between the `acquire` that issued it and the
/// matching `release`. Once the instance is checked out again the old
/// handle becomes stale, even though it points at the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    pub(crate) pool_id: u64,
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl PoolHandle {
    #[cfg(test)]
    pub(crate) fn new(index: usize, generation: u64) -> Self {
        Self {
            pool_id: 0,
            index,
            generation,
        }
    }

    /// Slot index of the instance inside its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Checkout generation of the slot this handle was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

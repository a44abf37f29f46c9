//! Per-group mutual exclusion for allocation.
//!
//! Two units of work that touch the same universal SKU group must not
//! interleave, or both could pick the same commitment. Work on different
//! groups runs in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AllocationError;

/// Registry of one mutex per universal SKU.
///
/// Entries are never pruned; the map holds at most one per universal SKU class.
#[derive(Debug, Default)]
pub struct GroupLocks {
    groups: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` while holding the lock for `universal_sku`.
    pub fn with_group<T>(
        &self,
        universal_sku: &str,
        work: impl FnOnce() -> Result<T, AllocationError>,
    ) -> Result<T, AllocationError> {
        let lock = self.lock_for(universal_sku)?;
        let _guard = lock.lock().map_err(|_| AllocationError::LockPoisoned)?;
        work()
    }

    /// Number of groups that have been locked at least once.
    pub fn len(&self) -> usize {
        self.groups.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_for(&self, universal_sku: &str) -> Result<Arc<Mutex<()>>, AllocationError> {
        let mut groups = self.groups.lock().map_err(|_| AllocationError::LockPoisoned)?;
        Ok(groups
            .entry(universal_sku.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}

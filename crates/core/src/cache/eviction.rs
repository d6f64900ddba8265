//! Entry-count bounds for partitions.
//!
//! Eviction is strict FIFO by insertion order. The size is re-read before
//! every deletion, and the read/delete sequence for a partition runs under
//! that partition's lock, so concurrent callers converge on the bound
//! without over-deleting.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::PartitionStore;
use crate::Error;

/// Trims bounded partitions down to their maximum entry count.
#[derive(Debug, Default)]
pub struct EvictionEnforcer {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EvictionEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, partition: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(partition.to_string()).or_default().clone()
    }

    /// Delete oldest-inserted entries until `len <= max_entries`.
    ///
    /// Returns the number of entries this call evicted.
    pub async fn enforce(&self, store: &dyn PartitionStore, partition: &str, max_entries: usize) -> Result<usize, Error> {
        let lock = self.lock_for(partition).await;
        let _guard = lock.lock().await;

        let mut evicted = 0;
        while store.len(partition).await? > max_entries {
            let Some(oldest) = store.oldest(partition).await? else {
                break;
            };
            if store.delete(partition, &oldest).await? {
                tracing::debug!(partition, identity = %oldest, "evicted oldest entry");
                evicted += 1;
            }
        }

        Ok(evicted)
    }
}

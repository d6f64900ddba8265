//! Named cache partitions.
//!
//! A partition maps [`RequestIdentity`] to an immutable [`Response`]
//! snapshot, ordered by insertion. Two stores implement
//! [`PartitionStore`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, with schema migrations
//! - [`MemoryStore`]: process-local, for tests and ephemeral hosts
//!
//! Bounded partitions are trimmed by [`EvictionEnforcer`] in strict
//! insertion (FIFO) order.

pub mod connection;
pub mod eviction;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod names;
pub mod partitions;

use async_trait::async_trait;

pub use crate::Error;
use crate::{RequestIdentity, Response};

pub use connection::CacheDb;
pub use eviction::EvictionEnforcer;
pub use memory::MemoryStore;
pub use names::PartitionNames;

/// Storage backend for named cache partitions.
///
/// Reads and deletes on a partition that does not exist succeed with an
/// empty result; writes create the partition on demand.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition if it does not exist yet.
    async fn open(&self, partition: &str) -> Result<(), Error>;

    /// Names of every existing partition, sorted.
    async fn partitions(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and all of its entries.
    ///
    /// Returns false if the partition did not exist.
    async fn delete_partition(&self, partition: &str) -> Result<bool, Error>;

    async fn get(&self, partition: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any previous entry for the identity.
    ///
    /// A replaced entry moves to the newest insertion position.
    async fn put(&self, partition: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error>;

    /// Store a batch of responses, all or nothing.
    ///
    /// Backends with transactions override this. The fallback writes one
    /// entry at a time and, if any write fails, restores every identity it
    /// already touched before returning the error.
    async fn put_all(&self, partition: &str, entries: &[(RequestIdentity, Response)]) -> Result<(), Error> {
        let mut written: Vec<(&RequestIdentity, Option<Response>)> = Vec::with_capacity(entries.len());

        for (identity, response) in entries {
            let result = match self.get(partition, identity).await {
                Ok(previous) => self.put(partition, identity, response).await.map(|()| previous),
                Err(e) => Err(e),
            };

            match result {
                Ok(previous) => written.push((identity, previous)),
                Err(e) => {
                    for (identity, previous) in written.into_iter().rev() {
                        let restored = match previous {
                            Some(response) => self.put(partition, identity, &response).await,
                            None => self.delete(partition, identity).await.map(|_| ()),
                        };
                        if let Err(undo) = restored {
                            tracing::warn!(partition, identity = %identity, error = %undo, "batch rollback failed");
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Delete a single entry. Returns false if it was not present.
    async fn delete(&self, partition: &str, identity: &RequestIdentity) -> Result<bool, Error>;

    /// Identities in insertion order, oldest first.
    async fn keys(&self, partition: &str) -> Result<Vec<RequestIdentity>, Error>;

    async fn len(&self, partition: &str) -> Result<usize, Error> {
        Ok(self.keys(partition).await?.len())
    }

    /// The oldest-inserted identity, if any.
    async fn oldest(&self, partition: &str) -> Result<Option<RequestIdentity>, Error> {
        Ok(self.keys(partition).await?.into_iter().next())
    }

    /// Look an identity up across several partitions, first hit wins.
    async fn match_any(&self, partitions: &[&str], identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        for partition in partitions {
            if let Some(response) = self.get(partition, identity).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

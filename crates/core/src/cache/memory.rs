//! In-memory partition store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PartitionStore;
use crate::{Error, RequestIdentity, Response};

/// Process-local [`PartitionStore`].
///
/// Each partition is a vector in insertion order; lookups are linear, which
/// is fine for the entry bounds this layer works with.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<String, Vec<(RequestIdentity, Response)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        self.partitions.write().await.entry(partition.to_string()).or_default();
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, Error> {
        Ok(self.partitions.write().await.remove(partition).is_some())
    }

    async fn get(&self, partition: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .and_then(|entries| entries.iter().find(|(id, _)| id == identity))
            .map(|(_, response)| response.clone()))
    }

    async fn put(&self, partition: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        let entries = partitions.entry(partition.to_string()).or_default();
        entries.retain(|(id, _)| id != identity);
        entries.push((identity.clone(), response.clone()));
        Ok(())
    }

    async fn put_all(&self, partition: &str, batch: &[(RequestIdentity, Response)]) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        let entries = partitions.entry(partition.to_string()).or_default();
        for (identity, response) in batch {
            entries.retain(|(id, _)| id != identity);
            entries.push((identity.clone(), response.clone()));
        }
        Ok(())
    }

    async fn delete(&self, partition: &str, identity: &RequestIdentity) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        let Some(entries) = partitions.get_mut(partition) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|(id, _)| id != identity);
        Ok(entries.len() < before)
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestIdentity>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition)
            .map(|entries| entries.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default())
    }

    async fn len(&self, partition: &str) -> Result<usize, Error> {
        Ok(self.partitions.read().await.get(partition).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Request;

    fn identity(path: &str) -> RequestIdentity {
        Request::get(&format!("https://app.test{path}")).unwrap().identity()
    }

    #[tokio::test]
    async fn test_round_trip_and_order() {
        let store = MemoryStore::new();
        store.put("p", &identity("/a"), &Response::new(200).with_body("a")).await.unwrap();
        store.put("p", &identity("/b"), &Response::new(200).with_body("b")).await.unwrap();
        store.put("p", &identity("/a"), &Response::new(200).with_body("a2")).await.unwrap();

        assert_eq!(store.keys("p").await.unwrap(), vec![identity("/b"), identity("/a")]);
        assert_eq!(store.get("p", &identity("/a")).await.unwrap().unwrap().body, "a2");
        assert_eq!(store.oldest("p").await.unwrap(), Some(identity("/b")));
    }

    #[tokio::test]
    async fn test_delete_entry_and_partition() {
        let store = MemoryStore::new();
        store.open("empty").await.unwrap();
        store.put("p", &identity("/a"), &Response::new(200)).await.unwrap();

        assert!(store.delete("p", &identity("/a")).await.unwrap());
        assert!(!store.delete("p", &identity("/a")).await.unwrap());
        assert_eq!(store.partitions().await.unwrap(), vec!["empty", "p"]);
        assert!(store.delete_partition("empty").await.unwrap());
        assert!(!store.delete_partition("empty").await.unwrap());
    }
}

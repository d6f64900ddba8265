//! Scripted [`Network`] and a failure-injecting [`PartitionStore`] for unit
//! tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use shelter_core::{Error, MemoryStore, PartitionStore, Request, RequestIdentity, Response};

use crate::fetch::Network;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Respond(Response),
    Fail(String),
    Hang,
}

/// Replies are keyed by canonical URL; unknown URLs fail like a dropped
/// connection.
#[derive(Debug, Default)]
pub(crate) struct ScriptedNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self, url: &str, reply: Reply) {
        let url = Request::get(url).unwrap().url.to_string();
        self.replies.lock().unwrap().insert(url, reply);
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.script(url, Reply::Respond(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.script(url, Reply::Fail("connection reset".into()));
    }

    pub(crate) fn hang(&self, url: &str) {
        self.script(url, Reply::Hang);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        let url = Request::get(url).unwrap().url.to_string();
        self.calls.lock().unwrap().iter().filter(|u| **u == url).count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{url}: offline")));
        }

        let reply = self.replies.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(Error::Network(format!("{url}: {message}"))),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(Error::Network(format!("{url}: no route"))),
        }
    }
}

/// [`MemoryStore`] whose `put` fails on demand. Counts `len` calls so tests
/// can tell whether eviction ran.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    /// 1-based index of the put call that fails; 0 means every put fails.
    fail_at: Option<usize>,
    puts: AtomicUsize,
    len_calls: AtomicUsize,
}

impl FlakyStore {
    pub(crate) fn failing_puts() -> Self {
        Self { fail_at: Some(0), ..Self::default() }
    }

    pub(crate) fn failing_put_at(n: usize) -> Self {
        Self { fail_at: Some(n), ..Self::default() }
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub(crate) fn len_calls(&self) -> usize {
        self.len_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionStore for FlakyStore {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        self.inner.open(partition).await
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.inner.partitions().await
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, Error> {
        self.inner.delete_partition(partition).await
    }

    async fn get(&self, partition: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        self.inner.get(partition, identity).await
    }

    async fn put(&self, partition: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(0) || self.fail_at == Some(n) {
            return Err(Error::CorruptEntry(format!("write rejected for {identity}")));
        }
        self.inner.put(partition, identity, response).await
    }

    async fn delete(&self, partition: &str, identity: &RequestIdentity) -> Result<bool, Error> {
        self.inner.delete(partition, identity).await
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestIdentity>, Error> {
        self.inner.keys(partition).await
    }

    async fn len(&self, partition: &str) -> Result<usize, Error> {
        self.len_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.len(partition).await
    }
}

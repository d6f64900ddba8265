//! [`PartitionStore`] implementation for [`CacheDb`].
//!
//! Entries keep a monotonically increasing `seq`; insertion order (and with
//! it eviction order) is `ORDER BY seq`. Overwrites delete and re-insert in
//! one transaction so a replaced entry becomes the newest.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::PartitionStore;
use super::connection::CacheDb;
use crate::{Error, RequestIdentity, Response};

fn encode_headers(headers: &[(String, String)]) -> Result<String, Error> {
    serde_json::to_string(headers).map_err(|e| Error::CorruptEntry(e.to_string()))
}

fn decode_headers(json: &str) -> Result<Vec<(String, String)>, Error> {
    serde_json::from_str(json).map_err(|e| Error::CorruptEntry(e.to_string()))
}

/// An entry encoded for the connection thread.
struct EntryRow {
    key: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(identity: &RequestIdentity, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key: identity.key(),
            method: identity.method.clone(),
            url: identity.url.clone(),
            status: response.status,
            headers_json: encode_headers(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

impl CacheDb {
    /// Write every row in one transaction; either all land or none do.
    async fn write_entries(&self, partition: &str, rows: Vec<EntryRow>) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.unchecked_transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![partition, now],
                )?;
                for row in &rows {
                    tx.execute("DELETE FROM entries WHERE partition = ?1 AND key = ?2", params![partition, row.key])?;
                    tx.execute(
                        "INSERT INTO entries (partition, key, method, url, status, headers_json, body, stored_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![partition, row.key, row.method, row.url, row.status, row.headers_json, row.body, now],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl PartitionStore for CacheDb {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![partition, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM partitions WHERE name = ?1", params![partition])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, partition: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let key = identity.key();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, headers_json, body FROM entries WHERE partition = ?1 AND key = ?2",
                        params![partition, key],
                        |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                match row {
                    Some((status, headers_json, body)) => Ok(Some(Response {
                        status,
                        headers: decode_headers(&headers_json)?,
                        body: body.into(),
                    })),
                    None => Ok(None),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        self.write_entries(partition, vec![EntryRow::new(identity, response)?]).await
    }

    async fn put_all(&self, partition: &str, entries: &[(RequestIdentity, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(identity, response)| EntryRow::new(identity, response))
            .collect::<Result<Vec<_>, Error>>()?;
        self.write_entries(partition, rows).await
    }

    async fn delete(&self, partition: &str, identity: &RequestIdentity) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key = identity.key();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted =
                    conn.execute("DELETE FROM entries WHERE partition = ?1 AND key = ?2", params![partition, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, partition: &str) -> Result<Vec<RequestIdentity>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestIdentity>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE partition = ?1 ORDER BY seq ASC")?;
                let keys = stmt
                    .query_map(params![partition], |row| {
                        Ok(RequestIdentity { method: row.get(0)?, url: row.get(1)? })
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn len(&self, partition: &str) -> Result<usize, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    async fn oldest(&self, partition: &str) -> Result<Option<RequestIdentity>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Option<RequestIdentity>, Error> {
                let oldest = conn
                    .query_row(
                        "SELECT method, url FROM entries WHERE partition = ?1 ORDER BY seq ASC LIMIT 1",
                        params![partition],
                        |row| Ok(RequestIdentity { method: row.get(0)?, url: row.get(1)? }),
                    )
                    .optional()?;
                Ok(oldest)
            })
            .await
            .map_err(Error::from)
    }
}

//! Open clients the cache layer can take control of.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use shelter_core::Error;

/// Host hook for claiming open clients on activation.
#[async_trait]
pub trait ClientController: Send + Sync {
    /// Take control of every open client without waiting for a reload.
    ///
    /// Returns the number of clients claimed.
    async fn claim(&self) -> Result<usize, Error>;
}

/// A client known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub id: String,
    pub controlled: bool,
}

/// In-process registry of open clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<Vec<ClientInfo>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client; re-registering an id is a no-op.
    pub async fn register(&self, id: &str) {
        let mut clients = self.clients.write().await;
        if !clients.iter().any(|c| c.id == id) {
            clients.push(ClientInfo { id: id.to_string(), controlled: false });
        }
    }

    pub async fn clients(&self) -> Vec<ClientInfo> {
        self.clients.read().await.clone()
    }
}

#[async_trait]
impl ClientController for ClientRegistry {
    async fn claim(&self) -> Result<usize, Error> {
        let mut clients = self.clients.write().await;
        for client in clients.iter_mut() {
            client.controlled = true;
        }
        Ok(clients.len())
    }
}

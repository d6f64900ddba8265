//! Shared server state: the router, lifecycle manager and host hooks.

use std::sync::Arc;

use shelter_client::{
    ClientRegistry, FetchClient, FetchConfig, LifecycleManager, Network, Notifier, StrategyRouter, SyncHook,
};
use shelter_core::{AppConfig, CacheDb, Error, PartitionStore};

use crate::host::{LogNotifier, LogSyncHook};

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PartitionStore>,
    pub router: StrategyRouter,
    pub lifecycle: LifecycleManager,
    pub clients: Arc<ClientRegistry>,
    pub notifier: Arc<dyn Notifier>,
    pub sync_hook: Arc<dyn SyncHook>,
}

impl AppState {
    /// Wire the components over an existing store and network.
    pub fn new(config: AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let clients = Arc::new(ClientRegistry::new());
        let router = StrategyRouter::from_config(&config, store.clone(), network.clone())?;
        let lifecycle = LifecycleManager::from_config(&config, store.clone(), network, clients.clone())?;

        Ok(Self {
            config,
            store,
            router,
            lifecycle,
            clients,
            notifier: Arc::new(LogNotifier),
            sync_hook: Arc::new(LogSyncHook),
        })
    }

    /// Open the SQLite store at `config.db_path` and a live fetch client.
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let store = Arc::new(CacheDb::open(&config.db_path).await?);
        let network = Arc::new(FetchClient::new(FetchConfig::from_app(&config))?);
        Self::new(config, store, network)
    }
}

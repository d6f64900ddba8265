//! Install, activation and control handling.
//!
//! ```text
//! uninstalled -> installing -> waiting -> activating -> active
//! ```
//!
//! Install pre-warms the static shell (all-or-nothing) and the third-party
//! partition (best-effort) in parallel, then skips waiting. Activation
//! deletes every partition outside the current whitelist and claims the
//! open clients.

pub mod clients;
pub mod control;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use tokio::sync::RwLock;

use shelter_core::request::resolve;
use shelter_core::{AppConfig, Destination, Error, PartitionNames, PartitionStore, Request, RequestIdentity, Response};

pub use clients::{ClientController, ClientInfo, ClientRegistry};
pub use control::{ControlMessage, ControlOutcome};

use crate::fetch::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Waiting,
    Activating,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub static_assets: usize,
    pub third_party_assets: usize,
    /// Set once install succeeds: the host should activate right away
    /// instead of waiting for older instances to close.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Partitions deleted because they are not in the whitelist.
    pub deleted: Vec<String>,
    pub clients_claimed: usize,
}

pub struct LifecycleManager {
    partitions: PartitionNames,
    static_assets: Vec<Request>,
    third_party_assets: Vec<Request>,
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientController>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
}

impl LifecycleManager {
    pub fn new(
        partitions: PartitionNames, static_assets: Vec<Request>, third_party_assets: Vec<Request>,
        store: Arc<dyn PartitionStore>, network: Arc<dyn Network>, clients: Arc<dyn ClientController>,
    ) -> Self {
        Self {
            partitions,
            static_assets,
            third_party_assets,
            store,
            network,
            clients,
            state: RwLock::new(LifecycleState::Uninstalled),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// Build a manager from application configuration, resolving the asset
    /// manifests against the configured origin.
    pub fn from_config(
        config: &AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>,
        clients: Arc<dyn ClientController>,
    ) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        let manifest = |assets: &[String]| -> Result<Vec<Request>, Error> {
            assets
                .iter()
                .map(|asset| -> Result<Request, Error> {
                    Ok(Request::from_url("GET", resolve(&origin, asset)?, Destination::Empty))
                })
                .collect()
        };

        Ok(Self::new(
            config.partition_names(),
            manifest(&config.static_assets)?,
            manifest(&config.third_party_assets)?,
            store,
            network,
            clients,
        ))
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    async fn set_state(&self, next: LifecycleState) -> LifecycleState {
        let mut state = self.state.write().await;
        let previous = std::mem::replace(&mut *state, next);
        tracing::info!(from = ?previous, to = ?next, "lifecycle transition");
        previous
    }

    /// Pre-warm the partitions and move to `waiting`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any static shell asset fails; the
    /// state is restored to what it was before the call.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let previous = self.set_state(LifecycleState::Installing).await;

        let (shell, third_party_assets) = tokio::join!(self.precache_static(), self.precache_third_party());

        let static_assets = match shell {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "install failed");
                self.set_state(previous).await;
                return Err(e);
            }
        };

        self.skip_waiting.store(true, Ordering::SeqCst);
        self.set_state(LifecycleState::Waiting).await;

        Ok(InstallReport { static_assets, third_party_assets, skip_waiting: true })
    }

    /// Whether a successful install asked to skip the waiting phase.
    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Activate straight away if install is done and skipped waiting.
    ///
    /// Returns `None` when there is nothing to do: no install yet, or the
    /// manager is not in `waiting`.
    pub async fn activate_if_skipping(&self) -> Result<Option<ActivationReport>, Error> {
        if !self.skips_waiting() || self.state().await != LifecycleState::Waiting {
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Fetch every static shell asset, then store them all.
    ///
    /// Nothing is written unless every fetch returned a 2xx response.
    async fn precache_static(&self) -> Result<usize, Error> {
        let partition = self.partitions.static_shell.as_str();
        let install_error = |e: Error| Error::InstallFailed(format!("{partition}: {e}"));

        self.store.open(partition).await.map_err(install_error)?;

        let fetched: Vec<(RequestIdentity, Response)> =
            try_join_all(self.static_assets.iter().map(|request| async move {
                let response = self
                    .network
                    .fetch(request)
                    .await
                    .map_err(|e| Error::InstallFailed(format!("{}: {e}", request.url)))?;
                if !response.is_success() {
                    return Err(Error::InstallFailed(format!("{} returned status {}", request.url, response.status)));
                }
                Ok::<_, Error>((request.identity(), response))
            }))
            .await?;

        self.store.put_all(partition, &fetched).await.map_err(install_error)?;

        tracing::info!(partition, assets = fetched.len(), "static shell cached");
        Ok(fetched.len())
    }

    /// Best-effort pre-population of the third-party partition.
    ///
    /// Returns how many assets were stored; failures are logged.
    pub async fn precache_third_party(&self) -> usize {
        let partition = self.partitions.third_party.as_str();

        if let Err(e) = self.store.open(partition).await {
            tracing::warn!(partition, error = %e, "could not open third-party partition");
            return 0;
        }

        let stored = join_all(self.third_party_assets.iter().map(|request| async move {
            match self.network.fetch(request).await {
                Ok(response) if response.is_cacheable() => {
                    match self.store.put(partition, &request.identity(), &response).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(url = %request.url, error = %e, "third-party cache write failed");
                            false
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!(url = %request.url, status = response.status, "third-party asset not cached");
                    false
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "third-party asset unavailable");
                    false
                }
            }
        }))
        .await;

        let count = stored.into_iter().filter(|ok| *ok).count();
        tracing::info!(partition, cached = count, total = self.third_party_assets.len(), "third-party assets cached");
        count
    }

    /// Delete unrecognized partitions, then claim open clients.
    ///
    /// Safe to call repeatedly; a second call deletes nothing.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let previous = self.set_state(LifecycleState::Activating).await;

        match self.prune_and_claim().await {
            Ok(report) => {
                self.set_state(LifecycleState::Active).await;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "activation failed");
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn prune_and_claim(&self) -> Result<ActivationReport, Error> {
        let stale: Vec<String> = self
            .store
            .partitions()
            .await?
            .into_iter()
            .filter(|name| !self.partitions.is_current(name))
            .collect();

        let results = try_join_all(stale.iter().map(|name| self.store.delete_partition(name))).await?;

        let deleted: Vec<String> = stale
            .into_iter()
            .zip(results)
            .filter_map(|(name, existed)| existed.then_some(name))
            .collect();
        for name in &deleted {
            tracing::info!(partition = %name, "deleted unrecognized partition");
        }

        let clients_claimed = self.clients.claim().await?;

        Ok(ActivationReport { deleted, clients_claimed })
    }

    /// Delete every partition, current or not.
    pub async fn clear_all(&self) -> Result<usize, Error> {
        let names = self.store.partitions().await?;
        let results = try_join_all(names.iter().map(|name| self.store.delete_partition(name))).await?;
        let cleared = results.into_iter().filter(|existed| *existed).count();
        tracing::info!(partitions = cleared, "cleared all partitions");
        Ok(cleared)
    }

    /// Handle a raw control payload. Malformed or unknown messages are
    /// ignored.
    pub async fn handle_message(&self, payload: &serde_json::Value) -> Result<ControlOutcome, Error> {
        let Some(message) = ControlMessage::parse(payload) else {
            tracing::debug!("ignoring malformed control message");
            return Ok(ControlOutcome::Ignored);
        };

        match message {
            ControlMessage::SkipWaiting => {
                let state = self.state().await;
                if state != LifecycleState::Waiting {
                    return Ok(ControlOutcome::NotWaiting { state });
                }
                let report = self.activate().await?;
                Ok(ControlOutcome::Activated { deleted: report.deleted, clients_claimed: report.clients_claimed })
            }
            ControlMessage::ClearCache => Ok(ControlOutcome::Cleared { partitions: self.clear_all().await? }),
            ControlMessage::CacheCdn => Ok(ControlOutcome::Revalidated { cached: self.precache_third_party().await }),
            ControlMessage::Unknown => {
                tracing::debug!("ignoring unknown control action");
                Ok(ControlOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyStore, ScriptedNetwork};
    use serde_json::json;
    use shelter_core::MemoryStore;

    const ORIGIN: &str = "https://notes.app";
    const CDN_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap.min.css";
    const CDN_JS: &str = "https://cdn.jsdelivr.net/npm/htmx.min.js";

    struct Harness {
        manager: LifecycleManager,
        store: Arc<MemoryStore>,
        network: Arc<ScriptedNetwork>,
        clients: Arc<ClientRegistry>,
    }

    fn harness(version: &str) -> Harness {
        let config = AppConfig {
            app_name: "notes".into(),
            cache_version: version.into(),
            origin: ORIGIN.into(),
            static_assets: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
            third_party_assets: vec![CDN_CSS.into(), CDN_JS.into()],
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(ScriptedNetwork::new());
        let clients = Arc::new(ClientRegistry::new());
        let manager = LifecycleManager::from_config(&config, store.clone(), network.clone(), clients.clone()).unwrap();
        Harness { manager, store, network, clients }
    }

    fn serve_shell(network: &ScriptedNetwork) {
        for path in ["/", "/offline.html", "/app.js"] {
            network.respond(&format!("{ORIGIN}{path}"), Response::new(200).with_body(path));
        }
    }

    #[tokio::test]
    async fn test_install_prewarms_and_waits() {
        let h = harness("v1");
        serve_shell(&h.network);
        h.network.respond(CDN_CSS, Response::new(200));
        h.network.fail(CDN_JS);

        let report = h.manager.install().await.unwrap();

        assert_eq!(report, InstallReport { static_assets: 3, third_party_assets: 1, skip_waiting: true });
        assert!(h.manager.skips_waiting());
        assert_eq!(h.manager.state().await, LifecycleState::Waiting);
        assert_eq!(h.store.len("notes-pwa-v1").await.unwrap(), 3);
        assert_eq!(h.store.len("notes-cdn-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let h = harness("v1");
        serve_shell(&h.network);
        h.network.respond(&format!("{ORIGIN}/app.js"), Response::new(404));

        let result = h.manager.install().await;

        assert!(matches!(result, Err(Error::InstallFailed(_))));
        assert_eq!(h.manager.state().await, LifecycleState::Uninstalled);
        assert_eq!(h.store.len("notes-pwa-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_install_rolls_back_when_a_write_fails() {
        let config = AppConfig {
            app_name: "notes".into(),
            origin: ORIGIN.into(),
            static_assets: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
            ..Default::default()
        };
        let store = Arc::new(FlakyStore::failing_put_at(2));
        let network = Arc::new(ScriptedNetwork::new());
        serve_shell(&network);
        let manager =
            LifecycleManager::from_config(&config, store.clone(), network, Arc::new(ClientRegistry::new())).unwrap();

        let result = manager.install().await;

        assert!(matches!(result, Err(Error::InstallFailed(_))));
        assert_eq!(manager.state().await, LifecycleState::Uninstalled);
        assert!(!manager.skips_waiting());
        assert_eq!(store.len("notes-pwa-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_if_skipping_after_install() {
        let h = harness("v2");
        serve_shell(&h.network);
        h.store.open("notes-pwa-v1").await.unwrap();

        assert_eq!(h.manager.activate_if_skipping().await.unwrap(), None);
        assert_eq!(h.manager.state().await, LifecycleState::Uninstalled);

        h.manager.install().await.unwrap();
        let report = h.manager.activate_if_skipping().await.unwrap().unwrap();

        assert_eq!(report.deleted, vec!["notes-pwa-v1"]);
        assert_eq!(h.manager.state().await, LifecycleState::Active);
        assert_eq!(h.manager.activate_if_skipping().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_install_fails_on_network_error() {
        let h = harness("v1");
        h.network.set_offline(true);

        assert!(matches!(h.manager.install().await, Err(Error::InstallFailed(_))));
    }

    #[tokio::test]
    async fn test_activate_prunes_unrecognized_partitions() {
        let h = harness("v2");
        for name in ["notes-pwa-v1", "notes-images-v1", "notes-pwa-v2", "notes-dynamic-v2", "other-app"] {
            h.store.open(name).await.unwrap();
        }
        h.clients.register("tab-1").await;

        let report = h.manager.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["notes-images-v1", "notes-pwa-v1", "other-app"]);
        assert_eq!(report.clients_claimed, 1);
        assert_eq!(h.store.partitions().await.unwrap(), vec!["notes-dynamic-v2", "notes-pwa-v2"]);
        assert_eq!(h.manager.state().await, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_activate_twice_is_idempotent() {
        let h = harness("v2");
        for name in ["notes-pwa-v1", "notes-pwa-v2", "notes-cdn-v2"] {
            h.store.open(name).await.unwrap();
        }

        h.manager.activate().await.unwrap();
        let after_first = h.store.partitions().await.unwrap();
        let second = h.manager.activate().await.unwrap();

        assert!(second.deleted.is_empty());
        assert_eq!(h.store.partitions().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_skip_waiting_activates_only_when_waiting() {
        let h = harness("v1");
        serve_shell(&h.network);

        let early = h.manager.handle_message(&json!({"action": "skipWaiting"})).await.unwrap();
        assert_eq!(early, ControlOutcome::NotWaiting { state: LifecycleState::Uninstalled });

        h.manager.install().await.unwrap();
        let outcome = h.manager.handle_message(&json!({"action": "skipWaiting"})).await.unwrap();

        assert!(matches!(outcome, ControlOutcome::Activated { .. }));
        assert_eq!(h.manager.state().await, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_clear_cache_deletes_everything() {
        let h = harness("v1");
        serve_shell(&h.network);
        h.manager.install().await.unwrap();
        h.store.open("legacy").await.unwrap();

        let outcome = h.manager.handle_message(&json!({"action": "clearCache"})).await.unwrap();

        assert_eq!(outcome, ControlOutcome::Cleared { partitions: 3 });
        assert!(h.store.partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_cdn_revalidates_third_party() {
        let h = harness("v1");
        h.network.respond(CDN_CSS, Response::new(200).with_body("v1"));
        h.network.respond(CDN_JS, Response::new(200));

        let outcome = h.manager.handle_message(&json!({"action": "cacheCDN"})).await.unwrap();

        assert_eq!(outcome, ControlOutcome::Revalidated { cached: 2 });
        assert_eq!(h.network.calls_for(CDN_CSS), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_messages_ignored() {
        let h = harness("v1");
        h.store.open("notes-pwa-v1").await.unwrap();

        for payload in [json!({"action": "selfDestruct"}), json!({}), json!([1, 2])] {
            assert_eq!(h.manager.handle_message(&payload).await.unwrap(), ControlOutcome::Ignored);
        }
        assert_eq!(h.store.partitions().await.unwrap(), vec!["notes-pwa-v1"]);
        assert_eq!(h.network.calls(), 0);
    }
}

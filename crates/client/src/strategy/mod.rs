//! Request routing and per-class caching strategies.
//!
//! | Class        | Strategy                               | Partition    |
//! |--------------|----------------------------------------|--------------|
//! | third party  | cache-first, refresh on miss           | third_party  |
//! | image        | cache-first                            | images (bounded) |
//! | api          | network-only, raced against a timeout  | none         |
//! | page         | network-first, cache then offline page | dynamic (bounded) |
//!
//! Non-GET and unlisted cross-origin requests go straight to the network.
//! Only status 200 responses are written through.

pub mod fallback;

mod api;
mod image;
mod page;
mod third_party;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use shelter_core::request::resolve;
use shelter_core::{
    AppConfig, Classification, Classifier, Destination, Error, EvictionEnforcer, PartitionNames, PartitionStore,
    Request, RequestIdentity, ResourceClass, Response,
};

use crate::fetch::Network;

/// Strategy tuning derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub api_timeout: Duration,
    pub max_dynamic_entries: usize,
    pub max_image_entries: usize,
    /// Absolute URL of the offline placeholder document.
    pub offline_page: Url,
}

impl StrategyConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        Ok(Self {
            api_timeout: config.api_timeout(),
            max_dynamic_entries: config.max_dynamic_entries,
            max_image_entries: config.max_image_entries,
            offline_page: resolve(&origin, &config.offline_page)?,
        })
    }
}

/// Dispatches intercepted requests to the strategy for their class.
pub struct StrategyRouter {
    classifier: Classifier,
    partitions: PartitionNames,
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    eviction: EvictionEnforcer,
    config: StrategyConfig,
}

impl StrategyRouter {
    pub fn new(
        classifier: Classifier, partitions: PartitionNames, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>,
        config: StrategyConfig,
    ) -> Self {
        Self { classifier, partitions, store, network, eviction: EvictionEnforcer::new(), config }
    }

    /// Build a router from application configuration.
    pub fn from_config(
        config: &AppConfig, store: Arc<dyn PartitionStore>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        Ok(Self::new(
            config.classifier()?,
            config.partition_names(),
            store,
            network,
            StrategyConfig::from_app(config)?,
        ))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn partitions(&self) -> &PartitionNames {
        &self.partitions
    }

    /// Handle one intercepted request.
    ///
    /// Errors only surface for pass-through requests, third-party
    /// non-stylesheet misses while offline, and pages when the offline
    /// placeholder is missing.
    pub async fn handle(&self, request: &Request) -> Result<Response, Error> {
        let class = match self.classifier.classify(request) {
            Classification::Ineligible | Classification::PassThrough => {
                tracing::debug!(method = %request.method, url = %request.url, "passing request through");
                return self.network.fetch(request).await;
            }
            Classification::Class(class) => class,
        };

        tracing::debug!(class = class.as_str(), url = %request.url, "routing request");

        match class {
            ResourceClass::ThirdParty => self.third_party(request).await,
            ResourceClass::Image => Ok(self.image(request).await),
            ResourceClass::Api => Ok(self.api(request).await),
            ResourceClass::Page => self.page(request).await,
        }
    }

    /// Cache read; storage failures degrade to a miss.
    async fn lookup(&self, partitions: &[&str], identity: &RequestIdentity) -> Option<Response> {
        match self.store.match_any(partitions, identity).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a copy of `response` and trim the partition if it is bounded.
    ///
    /// Failures are logged; the caller still returns its response.
    async fn write_through(
        &self, partition: &str, identity: &RequestIdentity, response: &Response, bound: Option<usize>,
    ) {
        if let Err(e) = self.store.put(partition, identity, response).await {
            tracing::warn!(partition, identity = %identity, error = %e, "cache write failed");
            return;
        }

        if let Some(max_entries) = bound
            && let Err(e) = self.eviction.enforce(self.store.as_ref(), partition, max_entries).await
        {
            tracing::warn!(partition, error = %e, "eviction failed");
        }
    }

    fn offline_identity(&self) -> RequestIdentity {
        Request::from_url("GET", self.config.offline_page.clone(), Destination::Document).identity()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::router;
    use super::*;

    #[tokio::test]
    async fn test_non_get_passes_through_uncached() {
        let (router, store, network) = router();
        network.respond("https://notes.app/api/notes", Response::new(201));

        let request = Request::new("POST", "https://notes.app/api/notes", Destination::Empty)
            .unwrap()
            .with_body("{\"title\":\"x\"}");
        let response = router.handle(&request).await.unwrap();

        assert_eq!(response.status, 201);
        assert!(store.partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through_and_propagates_errors() {
        let (router, store, network) = router();
        network.respond("https://tracker.example/p.gif", Response::new(200));

        let request = Request::new("GET", "https://tracker.example/p.gif", Destination::Image).unwrap();
        assert_eq!(router.handle(&request).await.unwrap().status, 200);
        assert!(store.partitions().await.unwrap().is_empty());

        network.fail("https://tracker.example/p.gif");
        assert!(router.handle(&request).await.is_err());
    }

    #[test]
    fn test_strategy_config_resolves_offline_page() {
        let config = StrategyConfig::from_app(&super::test_support::config()).unwrap();
        assert_eq!(config.offline_page.as_str(), "https://notes.app/offline.html");
        assert_eq!(config.api_timeout, Duration::from_secs(5));
    }
}

//! Network-only for API calls, raced against a timeout.

use shelter_core::{Request, Response};

use super::{StrategyRouter, fallback};

impl StrategyRouter {
    /// Nothing is cached. If the timer wins, the in-flight fetch is dropped
    /// and its result can never surface.
    pub(crate) async fn api(&self, request: &Request) -> Response {
        match tokio::time::timeout(self.config.api_timeout, self.network.fetch(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(url = %request.url, error = %err, "api call failed, serving offline payload");
                fallback::api_offline()
            }
            Err(_) => {
                tracing::warn!(
                    url = %request.url,
                    timeout_ms = self.config.api_timeout.as_millis() as u64,
                    "api call timed out, serving offline payload"
                );
                fallback::api_offline()
            }
        }
    }
}

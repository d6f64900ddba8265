//! Network-first for pages, falling back to cached copies and then to the
//! offline placeholder.

use shelter_core::{Error, Request, Response};

use super::StrategyRouter;

impl StrategyRouter {
    pub(crate) async fn page(&self, request: &Request) -> Result<Response, Error> {
        let dynamic = self.partitions.dynamic.as_str();
        let shell = self.partitions.static_shell.as_str();
        let identity = request.identity();

        let err = match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.write_through(dynamic, &identity, &response, Some(self.config.max_dynamic_entries))
                        .await;
                }
                return Ok(response);
            }
            Err(err) => err,
        };

        if let Some(hit) = self.lookup(&[dynamic, shell], &identity).await {
            tracing::debug!(identity = %identity, error = %err, "network failed, serving cached page");
            return Ok(hit);
        }

        if let Some(offline) = self.lookup(&[shell], &self.offline_identity()).await {
            tracing::debug!(identity = %identity, error = %err, "network failed, serving offline page");
            return Ok(offline);
        }

        tracing::warn!(identity = %identity, "offline page missing from static shell");
        Err(Error::OfflineUnavailable(format!("{identity}: {err}")))
    }
}

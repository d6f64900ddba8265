//! Cache-first for same-origin images, bounded partition.

use shelter_core::{Request, Response};

use super::{StrategyRouter, fallback};

impl StrategyRouter {
    pub(crate) async fn image(&self, request: &Request) -> Response {
        let partition = self.partitions.images.as_str();
        let identity = request.identity();

        if let Some(hit) = self.lookup(&[partition], &identity).await {
            tracing::debug!(identity = %identity, "image cache hit");
            return hit;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.write_through(partition, &identity, &response, Some(self.config.max_image_entries))
                        .await;
                }
                response
            }
            Err(err) => {
                tracing::debug!(identity = %identity, error = %err, "image unavailable");
                fallback::image_unavailable()
            }
        }
    }
}

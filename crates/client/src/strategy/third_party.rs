//! Cache-first with refresh on miss, for allowlisted third-party hosts.

use shelter_core::{Destination, Error, Request, Response};

use super::{StrategyRouter, fallback};

/// Stylesheet requests get an empty stylesheet instead of an error.
fn is_stylesheet(request: &Request) -> bool {
    let path = request.url.path();
    request.destination == Destination::Style || path.ends_with(".css") || path.starts_with("/css")
}

impl StrategyRouter {
    pub(crate) async fn third_party(&self, request: &Request) -> Result<Response, Error> {
        let partition = self.partitions.third_party.as_str();
        let identity = request.identity();

        if let Some(hit) = self.lookup(&[partition], &identity).await {
            tracing::debug!(identity = %identity, "third-party cache hit");
            return Ok(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.write_through(partition, &identity, &response, None).await;
                }
                Ok(response)
            }
            Err(err) => {
                // Another task may have stored it while this fetch was in flight.
                if let Some(hit) = self.lookup(&[partition], &identity).await {
                    return Ok(hit);
                }
                if is_stylesheet(request) {
                    tracing::warn!(identity = %identity, error = %err, "serving empty stylesheet");
                    return Ok(fallback::empty_stylesheet());
                }
                Err(err)
            }
        }
    }
}

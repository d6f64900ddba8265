//! Control messages from the host's command channel.

use serde::{Deserialize, Serialize};

use super::LifecycleState;

/// A message with an `action` tag. Unrecognized actions deserialize to
/// [`ControlMessage::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum ControlMessage {
    /// Finish activation now instead of waiting.
    #[serde(rename = "skipWaiting", alias = "force-activate")]
    SkipWaiting,

    /// Delete every partition.
    #[serde(rename = "clearCache", alias = "clear-all")]
    ClearCache,

    /// Re-run the best-effort third-party pre-population.
    #[serde(rename = "cacheCDN", alias = "revalidate-third-party")]
    CacheCdn,

    #[serde(other)]
    Unknown,
}

impl ControlMessage {
    /// Parse a raw payload; anything without a string `action` is `None`.
    pub fn parse(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ControlOutcome {
    Activated { deleted: Vec<String>, clients_claimed: usize },
    NotWaiting { state: LifecycleState },
    Cleared { partitions: usize },
    Revalidated { cached: usize },
    Ignored,
}

//! Push notification and background sync entry points.
//!
//! Both are thin delegations to host facilities; no caching happens here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shelter_core::Error;

/// A notification to display, decoded from a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Where a click on the notification navigates to.
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_title() -> String {
    "New notification".into()
}

fn default_url() -> String {
    "/".into()
}

impl Default for Notification {
    fn default() -> Self {
        Self { title: default_title(), body: String::new(), url: default_url() }
    }
}

impl Notification {
    /// Decode a push payload. Missing data yields the defaults; data that
    /// is not a JSON object becomes the notification body.
    pub fn from_push(data: Option<&str>) -> Self {
        let Some(text) = data.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::default();
        };
        serde_json::from_str(text).unwrap_or_else(|_| Self { body: text.to_string(), ..Self::default() })
    }
}

/// Host notification facility.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: &Notification) -> Result<(), Error>;

    /// Focus or open a client at `url`.
    async fn open(&self, url: &str) -> Result<(), Error>;
}

/// Host hook that replays offline work.
#[async_trait]
pub trait SyncHook: Send + Sync {
    async fn sync_offline_data(&self) -> Result<(), Error>;
}

/// Display the notification carried by a push event.
pub async fn handle_push(notifier: &dyn Notifier, data: Option<&str>) -> Result<Notification, Error> {
    let notification = Notification::from_push(data);
    notifier.show(&notification).await?;
    Ok(notification)
}

/// Navigate to the URL embedded in a clicked notification.
pub async fn handle_notification_click(notifier: &dyn Notifier, notification: &Notification) -> Result<(), Error> {
    notifier.open(&notification.url).await
}

/// Run the sync hook if `tag` is the known sync tag.
///
/// Returns whether the event was handled; the hook is awaited to completion
/// before returning.
pub async fn handle_sync(hook: &dyn SyncHook, known_tag: &str, tag: &str) -> Result<bool, Error> {
    if tag != known_tag {
        tracing::debug!(tag, "ignoring unknown sync tag");
        return Ok(false);
    }
    hook.sync_offline_data().await?;
    Ok(true)
}

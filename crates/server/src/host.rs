//! Host facilities for a headless stdio server.
//!
//! There is no display or window to drive, so notifications and sync runs
//! are recorded in the log.

use async_trait::async_trait;
use shelter_client::{Notification, Notifier, SyncHook};
use shelter_core::Error;

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(title = %notification.title, url = %notification.url, "notification shown");
        Ok(())
    }

    async fn open(&self, url: &str) -> Result<(), Error> {
        tracing::info!(url, "notification opened");
        Ok(())
    }
}

/// Offline data sync placeholder; nothing is queued for replay yet.
pub struct LogSyncHook;

#[async_trait]
impl SyncHook for LogSyncHook {
    async fn sync_offline_data(&self) -> Result<(), Error> {
        tracing::info!("offline data sync requested");
        Ok(())
    }
}

//! Push notification, notification click and background sync tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_client::{Notification, handle_notification_click, handle_push, handle_sync};

use super::json_result;
use crate::state::AppState;

/// Parameters for the push_notification tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Raw push payload. JSON with optional `title`, `body` and `url`;
    /// plain text is shown as the body.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushOutput {
    pub notification: Notification,
}

/// Parameters for the notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// URL embedded in the clicked notification (default: `/`).
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickOutput {
    pub opened: String,
}

/// Parameters for the background_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync event tag.
    pub tag: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutput {
    pub tag: String,
    pub handled: bool,
}

pub async fn push_impl(state: &AppState, params: PushParams) -> Result<CallToolResult, McpError> {
    let notification = handle_push(state.notifier.as_ref(), params.data.as_deref()).await?;
    json_result(&PushOutput { notification })
}

pub async fn click_impl(state: &AppState, params: NotificationClickParams) -> Result<CallToolResult, McpError> {
    let mut notification = Notification::default();
    if let Some(url) = params.url.filter(|u| !u.trim().is_empty()) {
        notification.url = url;
    }

    handle_notification_click(state.notifier.as_ref(), &notification).await?;
    json_result(&NotificationClickOutput { opened: notification.url })
}

pub async fn sync_impl(state: &AppState, params: SyncParams) -> Result<CallToolResult, McpError> {
    let handled = handle_sync(state.sync_hook.as_ref(), &state.config.sync_tag, &params.tag).await?;
    json_result(&SyncOutput { tag: params.tag, handled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{StaticNetwork, output, state};

    #[tokio::test]
    async fn test_push_impl_decodes_payload() {
        let state = state(StaticNetwork::default());
        let params = PushParams { data: Some(r#"{"title":"Saved","url":"/notes/7"}"#.into()) };

        let out = output(&push_impl(&state, params).await.unwrap());
        assert_eq!(out["notification"]["title"], "Saved");
        assert_eq!(out["notification"]["body"], "");
        assert_eq!(out["notification"]["url"], "/notes/7");
    }

    #[tokio::test]
    async fn test_push_impl_defaults_without_data() {
        let state = state(StaticNetwork::default());

        let out = output(&push_impl(&state, PushParams { data: None }).await.unwrap());
        assert_eq!(out["notification"]["title"], "New notification");
        assert_eq!(out["notification"]["url"], "/");
    }

    #[tokio::test]
    async fn test_click_impl_default_url() {
        let state = state(StaticNetwork::default());

        let out = output(&click_impl(&state, NotificationClickParams { url: None }).await.unwrap());
        assert_eq!(out["opened"], "/");
    }

    #[tokio::test]
    async fn test_sync_impl_known_and_unknown_tags() {
        let state = state(StaticNetwork::default());

        let out = output(&sync_impl(&state, SyncParams { tag: "sync-data".into() }).await.unwrap());
        assert_eq!(out["handled"], true);

        let out = output(&sync_impl(&state, SyncParams { tag: "other".into() }).await.unwrap());
        assert_eq!(out["handled"], false);
    }
}

//! partitions_list tool implementation.
//!
//! Reports every stored partition with its entry count and whether it is
//! part of the current whitelist.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;
use shelter_client::{ClientInfo, LifecycleState};

use super::json_result;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
    /// False for partitions left over from another cache version; those
    /// are deleted on the next activation.
    pub current: bool,
}

/// Output from the partitions_list tool.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionsListOutput {
    pub state: LifecycleState,
    pub whitelist: Vec<String>,
    pub partitions: Vec<PartitionSummary>,
    /// Open clients and whether activation has claimed them.
    pub clients: Vec<ClientInfo>,
}

pub async fn list_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let names = state.router.partitions();
    let mut partitions = Vec::new();

    for name in state.store.partitions().await? {
        let entries = state.store.len(&name).await?;
        partitions.push(PartitionSummary { current: names.is_current(&name), name, entries });
    }

    let output = PartitionsListOutput {
        state: state.lifecycle.state().await,
        whitelist: names.whitelist().iter().map(|n| n.to_string()).collect(),
        partitions,
        clients: state.clients.clients().await,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{output, shell_network, state};
    use serde_json::json;
    use shelter_core::{PartitionStore, Request, Response};

    #[tokio::test]
    async fn test_list_impl_empty() {
        let state = state(shell_network());

        let out = output(&list_impl(&state).await.unwrap());
        assert_eq!(out["state"], "uninstalled");
        assert_eq!(
            out["whitelist"],
            json!(["notes-pwa-v1", "notes-dynamic-v1", "notes-images-v1", "notes-cdn-v1"])
        );
        assert_eq!(out["partitions"], json!([]));
        assert_eq!(out["clients"], json!([]));
    }

    #[tokio::test]
    async fn test_list_impl_reports_claimed_clients() {
        let state = state(shell_network());
        state.clients.register("stdio").await;
        state.lifecycle.activate().await.unwrap();

        let out = output(&list_impl(&state).await.unwrap());
        assert_eq!(out["clients"], json!([{"id": "stdio", "controlled": true}]));
    }

    #[tokio::test]
    async fn test_list_impl_marks_stale() {
        let state = state(shell_network());
        state.lifecycle.install().await.unwrap();
        let identity = Request::get("https://notes.app/old").unwrap().identity();
        state.store.put("notes-dynamic-v0", &identity, &Response::new(200)).await.unwrap();

        let out = output(&list_impl(&state).await.unwrap());
        let partitions = out["partitions"].as_array().unwrap();

        let stale = partitions.iter().find(|p| p["name"] == "notes-dynamic-v0").unwrap();
        assert_eq!(stale["current"], false);
        assert_eq!(stale["entries"], 1);

        let shell = partitions.iter().find(|p| p["name"] == "notes-pwa-v1").unwrap();
        assert_eq!(shell["current"], true);
        assert_eq!(shell["entries"], 3);
    }
}

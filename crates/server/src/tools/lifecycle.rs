//! Lifecycle tools: install, activate and control messages.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelter_client::{ActivationReport, ControlOutcome, InstallReport, LifecycleState};

use super::json_result;
use crate::state::AppState;

/// Output from the lifecycle_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    pub state: LifecycleState,
    #[serde(flatten)]
    pub report: InstallReport,
    /// Present when install skipped waiting and activation ran.
    pub activation: Option<ActivationReport>,
}

/// Output from the lifecycle_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateOutput {
    pub state: LifecycleState,
    #[serde(flatten)]
    pub report: ActivationReport,
}

/// Parameters for the control_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ControlMessageParams {
    /// Message object with an `action` field: `skipWaiting`, `clearCache`
    /// or `cacheCDN`. Anything else is ignored.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControlMessageOutput {
    pub state: LifecycleState,
    #[serde(flatten)]
    pub outcome: ControlOutcome,
}

/// Install, then activate straight away since install skips waiting.
pub async fn install_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.lifecycle.install().await?;
    let activation = state.lifecycle.activate_if_skipping().await?;
    json_result(&InstallOutput { state: state.lifecycle.state().await, report, activation })
}

pub async fn activate_impl(state: &AppState) -> Result<CallToolResult, McpError> {
    let report = state.lifecycle.activate().await?;
    json_result(&ActivateOutput { state: state.lifecycle.state().await, report })
}

pub async fn control_impl(state: &AppState, params: ControlMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = state.lifecycle.handle_message(&params.message).await?;
    json_result(&ControlMessageOutput { state: state.lifecycle.state().await, outcome })
}

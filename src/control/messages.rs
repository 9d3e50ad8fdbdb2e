//! Control protocol wire types
//!
//! Envelopes (both directions):
//!
//! ```text
//! {"type":"control_request","request_id":"req_1","request":{"subtype":...}}
//! {"type":"control_response","response":{"subtype":"success","request_id":"req_1","response":{...}}}
//! {"type":"control_response","response":{"subtype":"error","request_id":"req_1","error":"..."}}
//! {"type":"control_cancel_request","request_id":"req_1"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::RequestId;
use crate::types::permissions::{PermissionMode, PermissionUpdate};

// ============================================================================
// Outbound requests (SDK -> CLI)
// ============================================================================

/// Options for rewinding session files
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewindFilesOptions {
    /// Message UUID to rewind to; absent means the start of the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message_id: Option<String>,
    /// Report what would change without touching files
    pub dry_run: bool,
}

/// Control request payloads this client sends
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum OutboundRequest {
    /// Register hooks and in-process tool servers, obtain the session ID
    Initialize {
        /// Hook registrations, rendered per event as
        /// `[{matcher, hookCallbackIds, timeout}]`
        #[serde(skip_serializing_if = "Option::is_none")]
        hooks: Option<serde_json::Value>,
        /// In-process tool server descriptors
        #[serde(rename = "sdkMcpServers", skip_serializing_if = "Option::is_none")]
        sdk_mcp_servers: Option<serde_json::Value>,
        /// Whether a permission callback is configured
        #[serde(rename = "canUseTool")]
        can_use_tool: bool,
        /// Alternate permission-prompt tool
        #[serde(
            rename = "permissionPromptToolName",
            skip_serializing_if = "Option::is_none"
        )]
        permission_prompt_tool_name: Option<String>,
    },
    /// Interrupt the current turn
    Interrupt,
    /// Switch the permission mode
    SetPermissionMode {
        /// New mode
        mode: PermissionMode,
    },
    /// Switch the model; an absent field clears the override
    SetModel {
        /// Model name, or absent to clear
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Change the thinking-token ceiling; absent clears it
    SetMaxThinkingTokens {
        /// New ceiling, or absent to clear
        #[serde(skip_serializing_if = "Option::is_none")]
        max_thinking_tokens: Option<u32>,
    },
    /// Restore session files to an earlier state
    RewindFiles(RewindFilesOptions),
    /// Replace the MCP server set
    McpSetServers {
        /// Server configurations, keyed by name
        servers: serde_json::Value,
    },
    /// Reconnect MCP servers
    McpReconnect {
        /// Servers to reconnect; absent means all
        #[serde(skip_serializing_if = "Option::is_none")]
        server_names: Option<Vec<String>>,
    },
    /// Enable or disable one MCP server
    McpToggle {
        /// Server name
        server_name: String,
        /// Desired state
        enabled: bool,
    },
}

/// Serialize an outbound control request envelope, newline-terminated
pub fn request_envelope(request_id: &RequestId, request: &OutboundRequest) -> Result<String> {
    let envelope = serde_json::json!({
        "type": "control_request",
        "request_id": request_id,
        "request": serde_json::to_value(request)?,
    });
    Ok(format!("{envelope}\n"))
}

/// Serialize a reply to an inbound control request, newline-terminated
#[must_use]
pub fn response_envelope(request_id: &str, result: &Result<serde_json::Value>) -> String {
    let response = match result {
        Ok(payload) => serde_json::json!({
            "subtype": "success",
            "request_id": request_id,
            "response": payload,
        }),
        Err(e) => serde_json::json!({
            "subtype": "error",
            "request_id": request_id,
            "error": e.to_string(),
        }),
    };
    let envelope = serde_json::json!({
        "type": "control_response",
        "response": response,
    });
    format!("{envelope}\n")
}

// ============================================================================
// Inbound requests (CLI -> SDK)
// ============================================================================

/// Control requests the CLI makes into this library
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum InboundControlRequest {
    /// Tool permission check
    CanUseTool {
        /// Tool being invoked
        tool_name: String,
        /// Tool input
        #[serde(default)]
        input: serde_json::Value,
        /// Permission suggestions from the CLI
        #[serde(default)]
        permission_suggestions: Option<Vec<PermissionUpdate>>,
        /// Path the CLI blocked on, if any
        #[serde(default)]
        blocked_path: Option<String>,
        /// Why the CLI escalated the decision
        #[serde(default)]
        decision_reason: Option<String>,
        /// Tool use the check belongs to
        #[serde(default)]
        tool_use_id: Option<String>,
        /// Agent making the call
        #[serde(default)]
        agent_id: Option<String>,
    },
    /// Invoke a registered hook callback
    HookCallback {
        /// Callback ID assigned at registration
        callback_id: String,
        /// Typed event input
        #[serde(default)]
        input: serde_json::Value,
        /// Tool use the event belongs to
        #[serde(default)]
        tool_use_id: Option<String>,
    },
    /// Invoke an in-process tool
    McpToolCall {
        /// Server name
        server_name: String,
        /// Tool name within the server
        tool_name: String,
        /// Decoded tool input
        #[serde(default)]
        input: serde_json::Value,
    },
}

/// A decoded inbound `control_response`
#[derive(Debug, Clone)]
pub struct InboundControlResponse {
    /// `success` or `error`
    pub subtype: String,
    /// ID of the request this answers
    pub request_id: String,
    /// Success payload
    pub response: Option<serde_json::Value>,
    /// Error message
    pub error: Option<String>,
}

impl InboundControlResponse {
    /// Decode the inner `response` object of a `control_response` envelope
    ///
    /// # Errors
    /// Returns `ClaudeError::ControlProtocol` when required fields are
    /// missing
    pub fn from_envelope(envelope: &serde_json::Value) -> Result<Self> {
        let response = envelope
            .get("response")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| {
                ClaudeError::control_protocol("control_response envelope has no response object")
            })?;
        let subtype = response
            .get("subtype")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ClaudeError::control_protocol("control_response has no subtype"))?
            .to_string();
        let request_id = response
            .get("request_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ClaudeError::control_protocol("control_response has no request_id"))?
            .to_string();
        Ok(Self {
            subtype,
            request_id,
            response: response.get("response").cloned(),
            error: response
                .get("error")
                .and_then(serde_json::Value::as_str)
                .map(String::from),
        })
    }
}

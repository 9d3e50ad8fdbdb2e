//! Router and dispatch tasks for `ClaudeSDKClient`
//!
//! The router is the only reader of the framed inbound stream. It must never
//! await a handler: every inbound control request runs in its own task, so a
//! slow hook or permission callback cannot stall message delivery or
//! control-response correlation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::Transport;
use crate::control::{ControlProtocol, InboundControlRequest};
use crate::error::{ClaudeError, Result};
use crate::hooks::HookRegistry;
use crate::mcp::SdkMcpServer;
use crate::message::parse_message;
use crate::permissions::PermissionDispatcher;
use crate::types::messages::Message;

/// Handlers for inbound control requests
pub(crate) struct Dispatcher<T: Transport> {
    pub(crate) engine: Arc<ControlProtocol<T>>,
    pub(crate) hooks: Arc<HookRegistry>,
    pub(crate) permissions: PermissionDispatcher,
    pub(crate) sdk_servers: Arc<HashMap<String, SdkMcpServer>>,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            hooks: Arc::clone(&self.hooks),
            permissions: self.permissions.clone(),
            sdk_servers: Arc::clone(&self.sdk_servers),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Handle one inbound control request and write the reply
    ///
    /// Handler failures become `subtype:"error"` replies; they never tear
    /// the connection down.
    pub(crate) async fn dispatch(self, request_id: String, request: serde_json::Value) {
        let result = self.handle(request).await;
        if let Err(e) = self.engine.send_response(&request_id, &result).await {
            log::error!("failed to answer control request {request_id}: {e}");
        }
    }

    async fn handle(&self, request: serde_json::Value) -> Result<serde_json::Value> {
        let parsed: InboundControlRequest = serde_json::from_value(request).map_err(|e| {
            ClaudeError::control_protocol(format!("unsupported control request: {e}"))
        })?;

        let token = self.engine.cancellation_token();
        match parsed {
            InboundControlRequest::CanUseTool {
                tool_name,
                input,
                permission_suggestions,
                blocked_path,
                decision_reason,
                tool_use_id,
                agent_id,
            } => {
                self.permissions
                    .dispatch(
                        tool_name,
                        input,
                        permission_suggestions,
                        blocked_path,
                        decision_reason,
                        tool_use_id,
                        agent_id,
                        &token,
                    )
                    .await
            }
            InboundControlRequest::HookCallback {
                callback_id,
                input,
                tool_use_id,
            } => {
                let output = self
                    .hooks
                    .dispatch(&callback_id, input, tool_use_id, &token)
                    .await?;
                Ok(serde_json::to_value(output)?)
            }
            InboundControlRequest::McpToolCall {
                server_name,
                tool_name,
                input,
            } => {
                let Some(server) = self.sdk_servers.get(&server_name) else {
                    return Err(ClaudeError::mcp(format!(
                        "unknown in-process MCP server: {server_name}"
                    )));
                };
                server.call_tool(&tool_name, input).await
            }
        }
    }
}

/// Route the framed inbound stream until it closes
///
/// Conversational messages keep their arrival order on `message_tx`;
/// control envelopes are peeled off to the engine; parse and framing errors
/// surface on the message stream without ending it. When the stream closes
/// (child death or transport close) every in-flight control request is
/// cancelled.
pub(crate) async fn router_task<T: Transport>(
    mut raw_rx: mpsc::UnboundedReceiver<Result<serde_json::Value>>,
    dispatcher: Dispatcher<T>,
    message_tx: mpsc::UnboundedSender<Result<Message>>,
) {
    while let Some(item) = raw_rx.recv().await {
        let value = match item {
            Ok(value) => value,
            Err(e) => {
                // Framing error; the stream itself stays usable.
                if message_tx.send(Err(e)).is_err() {
                    break;
                }
                continue;
            }
        };

        match value.get("type").and_then(serde_json::Value::as_str) {
            Some("control_response") => {
                if let Err(e) = dispatcher.engine.handle_response(&value).await {
                    log::warn!("malformed control_response: {e}");
                }
            }
            Some("control_cancel_request") => {
                if let Some(request_id) =
                    value.get("request_id").and_then(serde_json::Value::as_str)
                {
                    dispatcher.engine.handle_cancel(request_id).await;
                } else {
                    log::warn!("control_cancel_request without request_id");
                }
            }
            Some("control_request") => {
                let Some(request_id) = value
                    .get("request_id")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from)
                else {
                    log::warn!("control_request without request_id");
                    continue;
                };
                let request = value
                    .get("request")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                let dispatcher = dispatcher.clone();
                tokio::spawn(dispatcher.dispatch(request_id, request));
            }
            _ => {
                if message_tx.send(parse_message(value)).is_err() {
                    break;
                }
            }
        }
    }

    // The inbound stream is gone; fail outstanding waiters instead of
    // letting them ride out their deadlines.
    dispatcher.engine.shutdown().await;
}

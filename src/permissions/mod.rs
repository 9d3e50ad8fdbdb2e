//! Permission dispatch
//!
//! The CLI delegates tool-permission decisions to this library through
//! `can_use_tool` control requests. A single configured callback answers
//! them; its allow/deny result is rendered into the wire payload the CLI
//! expects.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::ToolName;
use crate::types::permissions::{
    CanUseToolCallback, PermissionResult, PermissionUpdate, ToolPermissionContext,
};

/// Dispatches `can_use_tool` requests to the configured callback
#[derive(Clone, Default)]
pub struct PermissionDispatcher {
    callback: Option<CanUseToolCallback>,
}

impl PermissionDispatcher {
    /// Create a dispatcher around an optional callback
    #[must_use]
    pub fn new(callback: Option<CanUseToolCallback>) -> Self {
        Self { callback }
    }

    /// Whether a callback is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.callback.is_some()
    }

    /// Answer one `can_use_tool` request
    ///
    /// Returns the wire payload (`behavior` allow/deny plus extras) for the
    /// control response.
    ///
    /// # Errors
    /// Returns `ClaudeError::ControlProtocol` when no callback is
    /// configured, or the callback's own error
    #[allow(clippy::too_many_arguments)]
    pub async fn dispatch(
        &self,
        tool_name: String,
        input: serde_json::Value,
        suggestions: Option<Vec<PermissionUpdate>>,
        blocked_path: Option<String>,
        decision_reason: Option<String>,
        tool_use_id: Option<String>,
        agent_id: Option<String>,
        parent: &CancellationToken,
    ) -> Result<serde_json::Value> {
        let Some(ref callback) = self.callback else {
            return Err(ClaudeError::control_protocol(
                "can_use_tool requested but no permission callback is configured",
            ));
        };

        let context = ToolPermissionContext {
            suggestions: suggestions.unwrap_or_default(),
            blocked_path,
            decision_reason,
            tool_use_id,
            agent_id,
            signal: parent.child_token(),
        };

        let result = callback(ToolName::new(tool_name), input, context).await?;
        result.to_wire()
    }
}

impl std::fmt::Debug for PermissionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionDispatcher")
            .field("callback", &self.callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Create a permission callback from an async closure
pub fn permission_callback<F, Fut>(f: F) -> CanUseToolCallback
where
    F: Fn(ToolName, serde_json::Value, ToolPermissionContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<PermissionResult>> + Send + 'static,
{
    Arc::new(move |tool_name, input, context| Box::pin(f(tool_name, input, context)))
}

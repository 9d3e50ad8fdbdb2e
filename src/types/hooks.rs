//! Hook type definitions
//!
//! Hooks are host-supplied callbacks the CLI invokes at well-known lifecycle
//! points. Registration is declared per event as a list of matchers; the CLI
//! does the matching and calls back by callback ID over the control protocol.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

// ============================================================================
// Hook Types
// ============================================================================

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before a tool is used
    PreToolUse,
    /// After a tool is used
    PostToolUse,
    /// When the user submits a prompt
    UserPromptSubmit,
    /// When the conversation stops
    Stop,
    /// When a subagent stops
    SubagentStop,
    /// Before compacting the conversation
    PreCompact,
    /// When a session starts
    SessionStart,
    /// When a session ends
    SessionEnd,
    /// During environment setup
    Setup,
    /// When a teammate agent goes idle
    TeammateIdle,
    /// When a background task completes
    TaskCompleted,
}

impl HookEvent {
    /// The event name used on the wire
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::PreCompact => "PreCompact",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::Setup => "Setup",
            Self::TeammateIdle => "TeammateIdle",
            Self::TaskCompleted => "TaskCompleted",
        }
    }
}

/// Hook decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookDecision {
    /// Block the action
    Block,
    /// Approve the action
    Approve,
}

/// Output returned by a hook callback
///
/// Aggregated across the matcher's callbacks and sent back to the CLI as the
/// `hook_callback` response payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookOutput {
    /// Whether the CLI should continue processing (`false` stops the turn)
    #[serde(skip_serializing_if = "Option::is_none", rename = "continue")]
    pub continue_: Option<bool>,
    /// Decision to block or approve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<HookDecision>,
    /// Reason shown when the hook stops the turn
    #[serde(skip_serializing_if = "Option::is_none", rename = "stopReason")]
    pub stop_reason: Option<String>,
    /// System message surfaced to the user
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemMessage")]
    pub system_message: Option<String>,
    /// Let the hook keep running in the background
    #[serde(skip_serializing_if = "Option::is_none", rename = "async")]
    pub async_: Option<bool>,
    /// Timeout for the async continuation, in seconds
    #[serde(skip_serializing_if = "Option::is_none", rename = "asyncTimeout")]
    pub async_timeout: Option<f64>,
    /// Event-specific extras
    #[serde(skip_serializing_if = "Option::is_none", rename = "hookSpecificOutput")]
    pub hook_specific_output: Option<serde_json::Value>,
}

/// Context passed to hook callbacks
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Advisory abort signal; cancelled when the engine shuts down or the
    /// per-matcher timeout fires
    pub signal: CancellationToken,
}

impl HookContext {
    /// Create a context with a fresh signal
    #[must_use]
    pub fn new(signal: CancellationToken) -> Self {
        Self { signal }
    }
}

/// Hook callback type
///
/// Receives the typed event input, an optional tool-use ID, and the context.
pub type HookCallback = Arc<
    dyn Fn(
            serde_json::Value,
            Option<String>,
            HookContext,
        ) -> Pin<Box<dyn Future<Output = Result<HookOutput>> + Send>>
        + Send
        + Sync,
>;

/// Hook matcher configuration
///
/// The `matcher` pattern is evaluated by the CLI, not by this library; the
/// callbacks are invoked in registration order when the CLI calls back.
#[derive(Clone)]
pub struct HookMatcher {
    /// Matcher pattern (e.g. a tool name like "Bash" or "Write|Edit")
    pub matcher: Option<String>,
    /// Callbacks invoked in order
    pub hooks: Vec<HookCallback>,
    /// Per-invocation timeout in seconds
    pub timeout: Option<f64>,
}

impl std::fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMatcher")
            .field("matcher", &self.matcher)
            .field("hooks", &format!("[{} callbacks]", self.hooks.len()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

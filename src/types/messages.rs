//! Message taxonomy for CLI output
//!
//! Every object the CLI writes to stdout is discriminated by a `type` field
//! into one of the [`Message`] variants below; `system` messages are further
//! discriminated by `subtype` into [`SystemMessage`]. Construction from raw
//! JSON happens in [`crate::message::parse_message`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::identifiers::SessionId;

// ============================================================================
// Content blocks
// ============================================================================

/// Content block types
///
/// `tool_result` content arriving as structured blocks is re-encoded into
/// canonical JSON text at parse time, so `content` is always a string here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content block
    Text {
        /// Text content
        text: String,
    },
    /// Thinking content block (extended thinking)
    Thinking {
        /// Thinking content
        thinking: String,
        /// Signature for verification
        #[serde(skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// Tool use request
    ToolUse {
        /// Tool use ID
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters
        input: serde_json::Value,
    },
    /// Tool execution result
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Result content
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Whether this is an error result
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// User content can be a plain string or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Plain string content
    Text(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

impl From<String> for UserContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for UserContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// User message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessageContent {
    /// Message role (always "user")
    pub role: String,
    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<UserContent>,
}

/// Assistant message body
#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessageContent {
    /// Model that generated the message
    pub model: String,
    /// Ordered content blocks
    pub content: Vec<ContentBlock>,
    /// Why generation stopped, when the CLI reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Error kind attached to the message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// System messages
// ============================================================================

/// System message, discriminated by `subtype`
///
/// The subtypes the CLI emits with a dedicated shape are typed below; every
/// variant keeps the raw envelope in `data` because system payloads are
/// free-form by contract. Subtypes this client does not know fall back to
/// [`SystemMessage::Other`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum SystemMessage {
    /// First message of a session
    Init {
        /// Session ID, when already assigned
        session_id: Option<SessionId>,
        /// CLI version string
        version: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Free-form status update
    Status {
        /// Status text
        status: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Marker between pre- and post-compaction history
    CompactBoundary {
        /// Why compaction ran (e.g. "auto", "manual")
        reason: Option<String>,
        /// Token count before compaction
        pre_compaction_tokens: Option<u64>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Background task state change
    TaskNotification {
        /// Task identifier
        task_id: Option<String>,
        /// Task status
        status: Option<String>,
        /// Human-readable summary
        summary: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Files written to durable storage
    FilesPersisted {
        /// Persisted file paths
        files: Vec<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// A hook began executing
    HookStarted {
        /// Hook event name
        hook_event: Option<String>,
        /// Hook invocation ID
        hook_id: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Progress from a running hook
    HookProgress {
        /// Hook invocation ID
        hook_id: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// A hook finished
    HookResponse {
        /// Hook invocation ID
        hook_id: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Any other system subtype
    Other {
        /// The unrecognized subtype
        #[serde(rename = "unknown_subtype")]
        subtype: String,
        /// Full envelope payload
        data: serde_json::Value,
    },
}

impl SystemMessage {
    /// The wire subtype of this system message
    #[must_use]
    pub fn subtype(&self) -> &str {
        match self {
            Self::Init { .. } => "init",
            Self::Status { .. } => "status",
            Self::CompactBoundary { .. } => "compact_boundary",
            Self::TaskNotification { .. } => "task_notification",
            Self::FilesPersisted { .. } => "files_persisted",
            Self::HookStarted { .. } => "hook_started",
            Self::HookProgress { .. } => "hook_progress",
            Self::HookResponse { .. } => "hook_response",
            Self::Other { subtype, .. } => subtype,
        }
    }
}

// ============================================================================
// Stream events
// ============================================================================

/// Body of a partial-update stream event
///
/// The CLI nests this under an `event` key, but flattened envelopes occur
/// too; the parser accepts both.
#[derive(Debug, Clone, Serialize)]
pub struct StreamEventBody {
    /// Event type (e.g. `content_block_delta`)
    pub event_type: String,
    /// Content block index the delta applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Incremental payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<serde_json::Value>,
    /// Raw event object as received
    pub raw: serde_json::Value,
}

// ============================================================================
// Messages
// ============================================================================

/// Typed message read from the CLI's stdout stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// User message (echoed input, synthetic turns, replays)
    User {
        /// Message body
        message: UserMessageContent,
        /// Message UUID
        uuid: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Parent tool use for nested conversations
        parent_tool_use_id: Option<String>,
        /// Whether the CLI synthesized this turn
        is_synthetic: Option<bool>,
        /// Whether this is a replay of an earlier turn
        is_replay: Option<bool>,
        /// Opaque tool-use result payload
        tool_use_result: Option<serde_json::Value>,
    },
    /// Assistant message
    Assistant {
        /// Message body
        message: AssistantMessageContent,
        /// Message UUID
        uuid: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Parent tool use for nested conversations
        parent_tool_use_id: Option<String>,
    },
    /// System message
    System(SystemMessage),
    /// Terminal message for a turn, with metrics
    Result {
        /// Result subtype (`success` or an error kind)
        subtype: String,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// API call duration in milliseconds
        duration_api_ms: u64,
        /// Whether this is an error result
        is_error: bool,
        /// Number of conversation turns
        num_turns: u32,
        /// Session ID
        session_id: Option<SessionId>,
        /// Total cost in USD
        total_cost_usd: Option<f64>,
        /// Token usage statistics
        usage: Option<serde_json::Value>,
        /// Per-model usage, keyed by model name
        model_usage: Option<HashMap<String, serde_json::Value>>,
        /// Tool permission denials recorded during the turn
        permission_denials: Option<serde_json::Value>,
        /// Errors recorded during the turn
        errors: Option<serde_json::Value>,
        /// Why the turn stopped
        stop_reason: Option<String>,
        /// Final result text
        result: Option<String>,
        /// Structured output payload
        structured_output: Option<serde_json::Value>,
    },
    /// Partial-update event
    StreamEvent {
        /// Event UUID
        uuid: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Parent tool use ID
        parent_tool_use_id: Option<String>,
        /// Event body
        event: StreamEventBody,
    },
    /// Authentication status change
    AuthStatus {
        /// Whether the CLI is authenticated
        is_authenticated: Option<bool>,
        /// Error text, when authentication failed
        error: Option<String>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Progress from a long-running tool
    ToolProgress {
        /// Tool use this progress belongs to
        tool_use_id: Option<String>,
        /// Tool name
        tool_name: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Parent tool use ID
        parent_tool_use_id: Option<String>,
        /// Seconds elapsed since the tool started
        elapsed_time_seconds: Option<f64>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Summary of a completed tool use
    ToolUseSummary {
        /// Tool use being summarized
        tool_use_id: Option<String>,
        /// Summary text
        summary: Option<String>,
        /// Session ID
        session_id: Option<SessionId>,
        /// Full envelope payload
        data: serde_json::Value,
    },
    /// Rate limit notification
    RateLimitEvent {
        /// Full envelope payload
        data: serde_json::Value,
    },
}

impl Message {
    /// Whether this is a successful `result` message
    ///
    /// False for every non-result variant.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Result {
                subtype,
                is_error: false,
                ..
            } if subtype == "success"
        )
    }

    /// The session ID carried on the envelope, if any
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::User { session_id, .. }
            | Self::Assistant { session_id, .. }
            | Self::Result { session_id, .. }
            | Self::StreamEvent { session_id, .. }
            | Self::ToolProgress { session_id, .. }
            | Self::ToolUseSummary { session_id, .. } => session_id.as_ref(),
            Self::System(sys) => match sys {
                SystemMessage::Init { session_id, .. }
                | SystemMessage::Status { session_id, .. }
                | SystemMessage::CompactBoundary { session_id, .. } => session_id.as_ref(),
                _ => None,
            },
            Self::AuthStatus { .. } | Self::RateLimitEvent { .. } => None,
        }
    }
}

//! Type definitions for the Claude Code client
//!
//! Organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `ToolName`, `RequestId`)
//! - [`messages`] - Message taxonomy and content blocks
//! - [`options`] - Configuration record, builder, and validation
//! - [`hooks`] - Hook events, outputs, and callbacks
//! - [`permissions`] - Permission modes, updates, and the permission callback
//! - [`mcp`] - MCP server configuration
//! - [`agent`] - System prompts and agent definitions

pub mod agent;
pub mod hooks;
pub mod identifiers;
pub mod mcp;
pub mod messages;
pub mod options;
pub mod permissions;

pub use identifiers::{RequestId, SessionId, ToolName};
pub use messages::{
    AssistantMessageContent, ContentBlock, Message, StreamEventBody, SystemMessage, UserContent,
    UserMessageContent,
};
pub use options::{
    ClaudeAgentOptions, ClaudeAgentOptionsBuilder, PluginConfig, StderrCallback, ToolPreset,
    ToolsConfig, validate_path_option,
};
pub use permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};

//! # Claude Code Client for Rust
//!
//! A Rust client library that drives the Claude Code CLI as a managed child
//! process and exposes a high-level, bidirectionally streaming
//! conversational API. The CLI is the agent runtime; this library is the
//! wire between your application and that runtime: it supervises the
//! subprocess, multiplexes its newline-delimited JSON stream into typed
//! messages and control traffic, serializes concurrent writers onto the
//! single stdin pipe, and guarantees clean shutdown under partial failure.
//!
//! ## Quick Start
//!
//! The simplest way to use this library is the one-shot [`query()`]
//! function:
//!
//! ```no_run
//! use claude_code_client::query;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     for message in query("What is 2 + 2?", None, None).await? {
//!         if let claude_code_client::Message::Assistant { message, .. } = message {
//!             log::info!("Claude: {:?}", message.content);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive sessions with [`ClaudeSDKClient`]
//!
//! For stateful conversations with bidirectional communication:
//!
//! ```no_run
//! # use claude_code_client::{ClaudeSDKClient, ClaudeAgentOptions};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::builder().max_turns(10).build();
//!
//! let mut client = ClaudeSDKClient::connect(options, None).await?;
//! client.send_user_message("Hello, Claude!", None).await?;
//!
//! for message in client.receive_response().await? {
//!     // Process messages...
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## In-process tools
//!
//! Tools hosted inside your process are advertised to the CLI and invoked
//! back over the control protocol:
//!
//! ```no_run
//! # use claude_code_client::mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
//! # use serde_json::json;
//! let calculator = SdkMcpServer::new("calculator")
//!     .version("1.0.0")
//!     .tool(SdkMcpTool::new(
//!         "add",
//!         "Add two numbers",
//!         json!({"type": "object", "properties": {
//!             "a": {"type": "number"},
//!             "b": {"type": "number"}
//!         }}),
//!         |input| async move {
//!             let sum = input["a"].as_f64().unwrap_or(0.0)
//!                     + input["b"].as_f64().unwrap_or(0.0);
//!             Ok(ToolResult::text(format!("Sum: {sum}")))
//!         },
//!     ));
//! ```
//!
//! ## Hooks and permissions
//!
//! Hook callbacks run at CLI lifecycle points; a permission callback
//! decides `can_use_tool` checks:
//!
//! ```no_run
//! # use claude_code_client::{ClaudeAgentOptions, HookEvent, HookOutput, PermissionResult};
//! # use claude_code_client::hooks::{HookMatcherBuilder, hook_callback};
//! # use claude_code_client::permissions::permission_callback;
//! # use std::collections::HashMap;
//! let hook = hook_callback(|_input, tool_name, _context| async move {
//!     log::info!("Tool used: {tool_name:?}");
//!     Ok(HookOutput::default())
//! });
//! let matcher = HookMatcherBuilder::new(Some("Bash")).add_hook(hook).build();
//!
//! let mut hooks = HashMap::new();
//! hooks.insert(HookEvent::PreToolUse, vec![matcher]);
//!
//! let options = ClaudeAgentOptions::builder()
//!     .hooks(hooks)
//!     .can_use_tool(permission_callback(|tool_name, _input, _context| async move {
//!         match tool_name.as_str() {
//!             "Read" | "Glob" => Ok(PermissionResult::allow()),
//!             other => Ok(PermissionResult::deny(format!("{other} is not allowed"))),
//!         }
//!     }))
//!     .build();
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: message taxonomy, options, and callback types
//! - [`query()`]: one-shot driver
//! - [`client`]: interactive bidirectional client
//! - [`transport`]: subprocess supervision and JSON line framing
//! - [`control`]: control-protocol correlation engine
//! - [`hooks`] / [`permissions`] / [`mcp`]: dispatch surface for inbound
//!   control requests
//! - [`message`]: parsing of raw envelopes into typed messages
//! - [`error`]: error taxonomy
//!
//! ## Requirements
//!
//! - Claude Code CLI on the PATH (or an explicit path):
//!   `npm install -g @anthropic-ai/claude-code`
//!
//! ## Error handling
//!
//! All fallible operations return [`Result<T, ClaudeError>`](Result):
//!
//! ```no_run
//! # use claude_code_client::{query, ClaudeError};
//! # async fn example() {
//! match query("Hello", None, None).await {
//!     Ok(messages) => { /* ... */ }
//!     Err(ClaudeError::CliNotFound { searched_paths }) => {
//!         log::error!("Claude Code not installed; searched {searched_paths:?}");
//!     }
//!     Err(e) => log::error!("Error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod control;
pub mod error;
pub mod hooks;
pub mod mcp;
pub mod message;
pub mod permissions;
pub mod query;
pub mod transport;
pub mod types;

// Re-export commonly used types for a flat public API
pub use client::{ClaudeSDKClient, ServerInfo};
pub use control::RewindFilesOptions;
pub use error::{ClaudeError, Result};
pub use hooks::{HookMatcherBuilder, HookRegistry, hook_callback};
pub use mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
pub use message::parse_message;
pub use permissions::{PermissionDispatcher, permission_callback};
pub use query::query;
pub use transport::{PromptInput, SubprocessTransport, Transport};

pub use types::agent::{AgentDefinition, SystemPrompt, SystemPromptPreset};
pub use types::hooks::{
    HookCallback, HookContext, HookDecision, HookEvent, HookMatcher, HookOutput,
};
pub use types::identifiers::{RequestId, SessionId, ToolName};
pub use types::mcp::{
    McpServerConfig, McpServers, McpStdioServerConfig, McpStreamableHttpConfig, SdkServerMarker,
};
pub use types::messages::{ContentBlock, Message, SystemMessage, UserContent};
pub use types::options::{
    ClaudeAgentOptions, ClaudeAgentOptionsBuilder, PluginConfig, ToolPreset, ToolsConfig,
};
pub use types::permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};

/// Version of this client library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

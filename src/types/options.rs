//! Client configuration options
//!
//! [`ClaudeAgentOptions`] is a plain record the argv builder and the
//! supervisor consume; [`ClaudeAgentOptions::validate`] enforces the option
//! semantics at connect time so a misconfigured client never spawns a child.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::agent::{AgentDefinition, SystemPrompt};
use super::hooks::{HookEvent, HookMatcher};
use super::identifiers::SessionId;
use super::mcp::McpServers;
use super::permissions::{CanUseToolCallback, PermissionMode, SettingSource};
use crate::error::{ClaudeError, Result};

/// Callback receiving each line the CLI writes to stderr
pub type StderrCallback = Arc<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// Tool selection
// ============================================================================

/// Tool preset selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPreset {
    /// The standard tool set (`--tools default`)
    Default,
    /// A named preset
    Named(String),
}

impl ToolPreset {
    /// The flag value for this preset
    #[must_use]
    pub fn as_flag_value(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::Named(name) => name,
        }
    }
}

/// Tool selection for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsConfig {
    /// Explicit tool list; an empty list disables all tools (`--tools ""`)
    List(Vec<String>),
    /// A preset
    Preset(ToolPreset),
}

// ============================================================================
// Plugins
// ============================================================================

/// Plugin configuration
#[derive(Debug, Clone)]
pub enum PluginConfig {
    /// Plugin rooted in a local directory; passed as `--plugin-dir`
    Local(PathBuf),
    /// Remote plugin reference; not forwarded to the CLI by this client
    Remote {
        /// Plugin location
        url: String,
    },
}

// ============================================================================
// Options
// ============================================================================

/// Configuration for a client or one-shot query
#[derive(Clone, Default)]
pub struct ClaudeAgentOptions {
    /// Tool selection
    pub tools: Option<ToolsConfig>,
    /// System prompt configuration
    pub system_prompt: Option<SystemPrompt>,
    /// MCP server configurations (external servers by record, in-process
    /// servers are added automatically from the client's registrations)
    pub mcp_servers: McpServers,
    /// Permission mode for tool execution
    pub permission_mode: Option<PermissionMode>,
    /// Required confirmation for [`PermissionMode::BypassPermissions`]
    pub dangerously_skip_permissions: bool,
    /// Continue the most recent conversation
    pub continue_conversation: bool,
    /// Session ID to resume from
    pub resume: Option<SessionId>,
    /// Message UUID to rewind the resumed session to; requires `resume`
    pub resume_session_at: Option<String>,
    /// Fork the session instead of appending when resuming
    pub fork_session: bool,
    /// Explicit session ID for new turns
    pub session_id: Option<SessionId>,
    /// Maximum number of turns before stopping
    pub max_turns: Option<u32>,
    /// Model to use
    pub model: Option<String>,
    /// Model to fall back to when `model` is overloaded; must differ from it
    pub fallback_model: Option<String>,
    /// Maximum thinking tokens per turn
    pub max_thinking_tokens: Option<u32>,
    /// Name of an MCP tool handling permission prompts; mutually exclusive
    /// with `can_use_tool`
    pub permission_prompt_tool_name: Option<String>,
    /// Working directory for the CLI process
    pub cwd: Option<PathBuf>,
    /// Settings: inline JSON object or a path to a settings file
    pub settings: Option<String>,
    /// Sandbox configuration merged under the settings `"sandbox"` key
    pub sandbox: Option<serde_json::Value>,
    /// Additional directories added to the context
    pub add_dirs: Vec<PathBuf>,
    /// Plugins to load
    pub plugins: Vec<PluginConfig>,
    /// Environment variables for the CLI process
    pub env: HashMap<String, String>,
    /// Extra CLI flags passed through verbatim
    pub extra_args: HashMap<String, Option<String>>,
    /// Maximum accumulated bytes per inbound JSON message (default 1 MiB)
    pub max_buffer_size: Option<usize>,
    /// Callback for tool permission checks
    pub can_use_tool: Option<CanUseToolCallback>,
    /// Hook registrations per event
    pub hooks: Option<HashMap<HookEvent, Vec<HookMatcher>>>,
    /// In-process tool servers; advertised to the CLI automatically
    pub sdk_mcp_servers: Vec<crate::mcp::SdkMcpServer>,
    /// Per-line stderr callback
    pub stderr: Option<StderrCallback>,
    /// Include partial-update stream events
    pub include_partial_messages: bool,
    /// Custom agent definitions
    pub agents: Option<HashMap<String, AgentDefinition>>,
    /// Setting sources to load
    pub setting_sources: Option<Vec<SettingSource>>,
}

impl ClaudeAgentOptions {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> ClaudeAgentOptionsBuilder {
        ClaudeAgentOptionsBuilder::default()
    }

    /// Check option semantics
    ///
    /// Called at connect time; a failure leaves the client unconnected.
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` on any invalid combination and
    /// on unsafe path options.
    pub fn validate(&self) -> Result<()> {
        if self.can_use_tool.is_some() && self.permission_prompt_tool_name.is_some() {
            return Err(ClaudeError::invalid_config(
                "can_use_tool and permission_prompt_tool_name are mutually exclusive",
            ));
        }
        if let (Some(model), Some(fallback)) = (&self.model, &self.fallback_model)
            && model == fallback
        {
            return Err(ClaudeError::invalid_config(
                "fallback_model must differ from model",
            ));
        }
        if self.permission_mode == Some(PermissionMode::BypassPermissions)
            && !self.dangerously_skip_permissions
        {
            return Err(ClaudeError::invalid_config(
                "bypassPermissions requires dangerously_skip_permissions",
            ));
        }
        if self.continue_conversation && self.resume.is_some() {
            return Err(ClaudeError::invalid_config(
                "continue_conversation and resume are mutually exclusive",
            ));
        }
        if self.resume_session_at.is_some() && self.resume.is_none() {
            return Err(ClaudeError::invalid_config(
                "resume_session_at requires resume",
            ));
        }
        if self.session_id.is_some() && self.resume.is_some() && !self.fork_session {
            return Err(ClaudeError::invalid_config(
                "providing session_id together with resume requires fork_session",
            ));
        }
        let mut server_names = std::collections::HashSet::new();
        for server in &self.sdk_mcp_servers {
            if !server_names.insert(server.name.as_str()) {
                return Err(ClaudeError::invalid_config(format!(
                    "duplicate in-process MCP server name: {}",
                    server.name
                )));
            }
        }
        for dir in &self.add_dirs {
            validate_path_option(dir, "add_dirs")?;
        }
        for plugin in &self.plugins {
            if let PluginConfig::Local(path) = plugin {
                validate_path_option(path, "plugins")?;
            }
        }
        Ok(())
    }
}

/// Reject paths that could escape or truncate an argv entry
///
/// # Errors
/// Returns `ClaudeError::InvalidConfig` for empty paths, `..` segments, and
/// NUL bytes.
pub fn validate_path_option(path: &Path, option: &str) -> Result<()> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(ClaudeError::invalid_config(format!(
            "{option}: path must not be empty"
        )));
    }
    if path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ClaudeError::invalid_config(format!(
            "{option}: path must not contain '..' segments: {}",
            path.display()
        )));
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(ClaudeError::invalid_config(format!(
            "{option}: path must not contain NUL bytes"
        )));
    }
    Ok(())
}

impl std::fmt::Debug for ClaudeAgentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAgentOptions")
            .field("tools", &self.tools)
            .field("system_prompt", &self.system_prompt)
            .field("mcp_servers", &self.mcp_servers)
            .field("permission_mode", &self.permission_mode)
            .field(
                "dangerously_skip_permissions",
                &self.dangerously_skip_permissions,
            )
            .field("continue_conversation", &self.continue_conversation)
            .field("resume", &self.resume)
            .field("resume_session_at", &self.resume_session_at)
            .field("fork_session", &self.fork_session)
            .field("session_id", &self.session_id)
            .field("max_turns", &self.max_turns)
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("max_thinking_tokens", &self.max_thinking_tokens)
            .field(
                "permission_prompt_tool_name",
                &self.permission_prompt_tool_name,
            )
            .field("cwd", &self.cwd)
            .field("settings", &self.settings)
            .field("sandbox", &self.sandbox)
            .field("add_dirs", &self.add_dirs)
            .field("plugins", &self.plugins)
            .field("env", &self.env)
            .field("extra_args", &self.extra_args)
            .field("max_buffer_size", &self.max_buffer_size)
            .field(
                "can_use_tool",
                &self.can_use_tool.as_ref().map(|_| "<callback>"),
            )
            .field(
                "hooks",
                &self
                    .hooks
                    .as_ref()
                    .map(|h| format!("[{} hook events]", h.len())),
            )
            .field("sdk_mcp_servers", &self.sdk_mcp_servers)
            .field("stderr", &self.stderr.as_ref().map(|_| "<callback>"))
            .field("include_partial_messages", &self.include_partial_messages)
            .field("agents", &self.agents)
            .field("setting_sources", &self.setting_sources)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClaudeAgentOptions`]
#[derive(Debug, Default)]
pub struct ClaudeAgentOptionsBuilder {
    options: ClaudeAgentOptions,
}

impl ClaudeAgentOptionsBuilder {
    /// Set an explicit tool list
    #[must_use]
    pub fn tools(mut self, tools: Vec<impl Into<String>>) -> Self {
        self.options.tools = Some(ToolsConfig::List(
            tools.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Select a tool preset
    #[must_use]
    pub fn tool_preset(mut self, preset: ToolPreset) -> Self {
        self.options.tools = Some(ToolsConfig::Preset(preset));
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<SystemPrompt>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }

    /// Set external MCP servers
    #[must_use]
    pub fn mcp_servers(
        mut self,
        servers: HashMap<String, super::mcp::McpServerConfig>,
    ) -> Self {
        self.options.mcp_servers = McpServers::Dict(servers);
        self
    }

    /// Set the permission mode
    #[must_use]
    pub const fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.options.permission_mode = Some(mode);
        self
    }

    /// Confirm bypassing permission prompts
    #[must_use]
    pub const fn dangerously_skip_permissions(mut self) -> Self {
        self.options.dangerously_skip_permissions = true;
        self
    }

    /// Continue the most recent conversation
    #[must_use]
    pub const fn continue_conversation(mut self) -> Self {
        self.options.continue_conversation = true;
        self
    }

    /// Resume a session by ID
    #[must_use]
    pub fn resume(mut self, session_id: impl Into<SessionId>) -> Self {
        self.options.resume = Some(session_id.into());
        self
    }

    /// Fork the session when resuming
    #[must_use]
    pub const fn fork_session(mut self) -> Self {
        self.options.fork_session = true;
        self
    }

    /// Set the maximum number of turns
    #[must_use]
    pub const fn max_turns(mut self, turns: u32) -> Self {
        self.options.max_turns = Some(turns);
        self
    }

    /// Set the model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Set the fallback model
    #[must_use]
    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.options.fallback_model = Some(model.into());
        self
    }

    /// Set the thinking-token ceiling
    #[must_use]
    pub const fn max_thinking_tokens(mut self, tokens: u32) -> Self {
        self.options.max_thinking_tokens = Some(tokens);
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Set settings (inline JSON or a file path)
    #[must_use]
    pub fn settings(mut self, settings: impl Into<String>) -> Self {
        self.options.settings = Some(settings.into());
        self
    }

    /// Set the sandbox configuration
    #[must_use]
    pub fn sandbox(mut self, sandbox: serde_json::Value) -> Self {
        self.options.sandbox = Some(sandbox);
        self
    }

    /// Add a context directory
    #[must_use]
    pub fn add_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.add_dirs.push(dir.into());
        self
    }

    /// Add a plugin
    #[must_use]
    pub fn plugin(mut self, plugin: PluginConfig) -> Self {
        self.options.plugins.push(plugin);
        self
    }

    /// Add an environment variable for the CLI process
    #[must_use]
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Set the permission callback
    #[must_use]
    pub fn can_use_tool(mut self, callback: CanUseToolCallback) -> Self {
        self.options.can_use_tool = Some(callback);
        self
    }

    /// Set hook registrations
    #[must_use]
    pub fn hooks(mut self, hooks: HashMap<HookEvent, Vec<HookMatcher>>) -> Self {
        self.options.hooks = Some(hooks);
        self
    }

    /// Add an in-process tool server
    #[must_use]
    pub fn sdk_mcp_server(mut self, server: crate::mcp::SdkMcpServer) -> Self {
        self.options.sdk_mcp_servers.push(server);
        self
    }

    /// Set the stderr callback
    #[must_use]
    pub fn stderr(mut self, callback: StderrCallback) -> Self {
        self.options.stderr = Some(callback);
        self
    }

    /// Include partial-update stream events
    #[must_use]
    pub const fn include_partial_messages(mut self) -> Self {
        self.options.include_partial_messages = true;
        self
    }

    /// Set custom agent definitions
    #[must_use]
    pub fn agents(mut self, agents: HashMap<String, AgentDefinition>) -> Self {
        self.options.agents = Some(agents);
        self
    }

    /// Set setting sources
    #[must_use]
    pub fn setting_sources(mut self, sources: Vec<SettingSource>) -> Self {
        self.options.setting_sources = Some(sources);
        self
    }

    /// Set the inbound message buffer limit
    #[must_use]
    pub const fn max_buffer_size(mut self, bytes: usize) -> Self {
        self.options.max_buffer_size = Some(bytes);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ClaudeAgentOptions {
        self.options
    }
}

//! MCP server configuration types
//!
//! External MCP servers (stdio, HTTP, streamable HTTP) are configuration
//! records passed to the CLI verbatim. In-process servers live in
//! [`crate::mcp`]; here they appear only as a marker so the CLI's tool
//! discovery knows to route their calls back over the control protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// MCP stdio server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpStdioServerConfig {
    /// Server type (stdio)
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub server_type: Option<String>,
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

/// MCP streamable-HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpStreamableHttpConfig {
    /// Server type (`http` / `sse`)
    #[serde(rename = "type")]
    pub server_type: String,
    /// Server URL
    pub url: String,
    /// HTTP headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// MCP server configuration
#[derive(Debug, Clone)]
pub enum McpServerConfig {
    /// Stdio-based MCP server
    Stdio(McpStdioServerConfig),
    /// HTTP-based MCP server
    Http(McpStreamableHttpConfig),
    /// In-process server hosted by this library
    Sdk(SdkServerMarker),
}

/// Marker for an in-process server in `--mcp-config`
#[derive(Debug, Clone)]
pub struct SdkServerMarker {
    /// Server name; must match a registered [`crate::mcp::SdkMcpServer`]
    pub name: String,
}

impl McpServerConfig {
    /// Serialize this configuration the way `--mcp-config` expects it
    #[must_use]
    pub fn to_cli_json(&self) -> serde_json::Value {
        match self {
            Self::Stdio(stdio) => {
                let mut obj = serde_json::json!({ "command": stdio.command });
                if let Some(ref args) = stdio.args {
                    obj["args"] = serde_json::json!(args);
                }
                if let Some(ref env) = stdio.env {
                    obj["env"] = serde_json::json!(env);
                }
                if let Some(ref server_type) = stdio.server_type {
                    obj["type"] = serde_json::json!(server_type);
                }
                obj
            }
            Self::Http(http) => serde_json::json!({
                "type": http.server_type,
                "url": http.url,
                "headers": http.headers,
            }),
            Self::Sdk(sdk) => serde_json::json!({
                "type": "sdk",
                "name": sdk.name,
            }),
        }
    }
}

/// MCP servers container
#[derive(Debug, Clone, Default)]
pub enum McpServers {
    /// No MCP servers
    #[default]
    None,
    /// Named server configurations
    Dict(HashMap<String, McpServerConfig>),
    /// Path to an MCP configuration file
    Path(PathBuf),
}

//! In-process tool server
//!
//! An [`SdkMcpServer`] hosts tools inside the client process. The CLI learns
//! about these servers twice: through the `initialize` payload and through a
//! `"type":"sdk"` entry in `--mcp-config`, so its tool discovery lists them.
//! Invocations arrive as `mcp_tool_call` control requests and are answered
//! with the handler's [`ToolResult`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ClaudeError, Result};

/// One content element of a tool result
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResultContent {
    /// Text content
    Text {
        /// The text
        text: String,
    },
}

/// Structured result returned by a tool handler
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolResult {
    /// Ordered content elements
    pub content: Vec<ToolResultContent>,
    /// Whether the invocation failed
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// A failed text result
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error: true,
        }
    }
}

/// Async tool handler
pub type ToolHandler = Arc<
    dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = Result<ToolResult>> + Send>>
        + Send
        + Sync,
>;

/// A tool hosted by an in-process server
#[derive(Clone)]
pub struct SdkMcpTool {
    /// Tool name; unique within its server
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON Schema of the tool input
    pub input_schema: serde_json::Value,
    handler: ToolHandler,
}

impl SdkMcpTool {
    /// Create a tool from an async closure
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Arc::new(move |input| Box::pin(handler(input))),
        }
    }

    /// Derive the input schema from a type
    #[must_use]
    pub fn schema_for<T: schemars::JsonSchema>() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| {
            serde_json::json!({ "type": "object" })
        })
    }

    /// Invoke the handler
    ///
    /// # Errors
    /// Propagates the handler's error
    pub async fn invoke(&self, input: serde_json::Value) -> Result<ToolResult> {
        (self.handler)(input).await
    }
}

impl std::fmt::Debug for SdkMcpTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkMcpTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// An in-process tool server
///
/// The name-to-tool index lives on the server record itself, so lookup
/// needs no shared registry and the index dies with the server.
#[derive(Debug, Clone)]
pub struct SdkMcpServer {
    /// Server name; unique per client
    pub name: String,
    /// Server version advertised to the CLI
    pub version: String,
    tools: Vec<Arc<SdkMcpTool>>,
    index: HashMap<String, usize>,
}

impl SdkMcpServer {
    /// Create an empty server
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Set the advertised version
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a tool
    ///
    /// # Panics
    /// Panics if a tool with the same name is already registered
    #[must_use]
    pub fn tool(mut self, tool: SdkMcpTool) -> Self {
        assert!(
            !self.index.contains_key(&tool.name),
            "duplicate tool name {:?} on server {:?}",
            tool.name,
            self.name
        );
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(Arc::new(tool));
        self
    }

    /// Look a tool up by name
    #[must_use]
    pub fn lookup(&self, tool_name: &str) -> Option<&Arc<SdkMcpTool>> {
        self.index.get(tool_name).map(|&idx| &self.tools[idx])
    }

    /// The registered tools, in registration order
    #[must_use]
    pub fn tools(&self) -> &[Arc<SdkMcpTool>] {
        &self.tools
    }

    /// Descriptor carried in the `initialize` payload
    #[must_use]
    pub fn descriptor(&self) -> serde_json::Value {
        let tools: Vec<serde_json::Value> = self
            .tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect();
        serde_json::json!({
            "name": self.name,
            "version": self.version,
            "tools": tools,
        })
    }

    /// Handle an `mcp_tool_call` aimed at this server
    ///
    /// # Errors
    /// Returns `ClaudeError::Mcp` for unknown tools; handler errors
    /// propagate
    pub async fn call_tool(
        &self,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let Some(tool) = self.lookup(tool_name) else {
            return Err(ClaudeError::mcp(format!(
                "server {:?} has no tool {tool_name:?}",
                self.name
            )));
        };
        let result = tool.invoke(input).await?;
        Ok(serde_json::to_value(result)?)
    }
}

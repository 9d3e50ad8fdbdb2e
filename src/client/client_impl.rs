//! Constructor and public API of `ClaudeSDKClient`

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::mpsc;

use crate::control::{
    ControlProtocol, INIT_REQUEST_TIMEOUT, OutboundRequest, RewindFilesOptions,
};
use crate::error::{ClaudeError, Result};
use crate::hooks::HookRegistry;
use crate::mcp::SdkMcpServer;
use crate::permissions::PermissionDispatcher;
use crate::transport::{PromptInput, SubprocessTransport, Transport};
use crate::types::identifiers::SessionId;
use crate::types::mcp::{McpServerConfig, McpServers, SdkServerMarker};
use crate::types::messages::{Message, UserContent};
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::PermissionMode;

use super::tasks::{Dispatcher, router_task};
use super::{ClaudeSDKClient, ConnectionState, ServerInfo};

impl ClaudeSDKClient {
    /// Connect in streaming mode
    ///
    /// Validates the options, spawns the CLI, starts the router, and runs
    /// the single `initialize` round-trip that registers hooks and
    /// in-process tool servers and yields the session ID. A failure at any
    /// of these steps leaves no child process behind.
    ///
    /// # Arguments
    /// * `options` - Configuration options
    /// * `cli_path` - Explicit CLI path; searched for when `None`
    ///
    /// # Errors
    /// Returns locate, version, launch, and validation errors at connect
    /// time; the handshake's own timeout or error also fails the connect
    pub async fn connect(
        mut options: ClaudeAgentOptions,
        cli_path: Option<PathBuf>,
    ) -> Result<Self> {
        options.validate()?;

        let hooks = Arc::new(HookRegistry::new(options.hooks.as_ref()));
        let permissions = PermissionDispatcher::new(options.can_use_tool.clone());
        let sdk_servers: Arc<HashMap<String, SdkMcpServer>> = Arc::new(
            options
                .sdk_mcp_servers
                .iter()
                .map(|server| (server.name.clone(), server.clone()))
                .collect(),
        );

        // The CLI's tool discovery must see in-process servers too, so they
        // are added to --mcp-config as "sdk" markers.
        if !sdk_servers.is_empty() {
            let mut dict = match std::mem::take(&mut options.mcp_servers) {
                McpServers::Dict(dict) => dict,
                McpServers::None => HashMap::new(),
                path @ McpServers::Path(_) => {
                    options.mcp_servers = path;
                    return Err(ClaudeError::invalid_config(
                        "in-process MCP servers cannot be combined with a file-based MCP config",
                    ));
                }
            };
            for name in sdk_servers.keys() {
                dict.insert(
                    name.clone(),
                    McpServerConfig::Sdk(SdkServerMarker { name: name.clone() }),
                );
            }
            options.mcp_servers = McpServers::Dict(dict);
        }

        let can_use_tool = permissions.is_configured();
        let permission_prompt_tool_name = options.permission_prompt_tool_name.clone();
        let hooks_payload = hooks.init_payload();
        let server_descriptors = if sdk_servers.is_empty() {
            None
        } else {
            let descriptors: HashMap<&String, serde_json::Value> = sdk_servers
                .iter()
                .map(|(name, server)| (name, server.descriptor()))
                .collect();
            Some(serde_json::to_value(descriptors)?)
        };

        let mut transport = SubprocessTransport::new(PromptInput::Stream, options, cli_path)?;
        transport.connect().await?;
        let raw_rx = transport.read_messages();
        let transport = Arc::new(transport);

        let engine = Arc::new(ControlProtocol::new(Arc::clone(&transport)));
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher {
            engine: Arc::clone(&engine),
            hooks,
            permissions,
            sdk_servers,
        };
        let router_task = tokio::spawn(router_task(raw_rx, dispatcher, message_tx));

        let client = Self {
            transport: Arc::clone(&transport),
            engine: Arc::clone(&engine),
            message_rx,
            state: Arc::new(parking_lot::Mutex::new(ConnectionState::default())),
            router_task: Some(router_task),
        };

        let init_response = engine
            .send_request_with_timeout(
                OutboundRequest::Initialize {
                    hooks: hooks_payload,
                    sdk_mcp_servers: server_descriptors,
                    can_use_tool,
                    permission_prompt_tool_name,
                },
                INIT_REQUEST_TIMEOUT,
            )
            .await;

        let init_response = match init_response {
            Ok(response) => response,
            Err(e) => {
                let _ = transport.close().await;
                return Err(e);
            }
        };

        let session_id = init_response
            .get("session_id")
            .and_then(serde_json::Value::as_str)
            .map(SessionId::new);
        let server_info: ServerInfo =
            serde_json::from_value(init_response).unwrap_or_default();

        {
            let mut state = client.state.lock();
            state.connected = true;
            state.session_id = session_id;
            state.server_info = Some(server_info);
        }

        Ok(client)
    }

    fn ensure_connected(&self) -> Result<()> {
        let state = self.state.lock();
        if state.connected && !state.closed {
            Ok(())
        } else {
            Err(ClaudeError::connection("client is not connected"))
        }
    }

    /// Session ID observed during initialization
    ///
    /// Immutable for the life of the connection.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.state.lock().session_id.clone()
    }

    /// Server metadata from the `initialize` response
    #[must_use]
    pub fn server_info(&self) -> Option<ServerInfo> {
        self.state.lock().server_info.clone()
    }

    /// Whether the client is connected
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let state = self.state.lock();
        state.connected && !state.closed
    }

    /// Exit error of the child, once it has been reaped
    #[must_use]
    pub fn exit_error(&self) -> Option<ClaudeError> {
        self.transport.exit_error()
    }

    /// Send a user turn
    ///
    /// # Arguments
    /// * `text` - Message text
    /// * `session_id` - Target session; defaults to the connection's session
    ///
    /// # Errors
    /// Returns a connection error when not connected, or the write error
    pub async fn send_user_message(
        &self,
        text: impl Into<String>,
        session_id: Option<&SessionId>,
    ) -> Result<()> {
        self.send_user_content(UserContent::Text(text.into()), session_id)
            .await
    }

    /// Send a user turn with block content
    ///
    /// # Errors
    /// Returns a connection error when not connected, or the write error
    pub async fn send_user_content(
        &self,
        content: UserContent,
        session_id: Option<&SessionId>,
    ) -> Result<()> {
        self.ensure_connected()?;

        let session_id = session_id
            .cloned()
            .or_else(|| self.state.lock().session_id.clone())
            .unwrap_or_else(|| SessionId::new("default"));

        let message = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": content,
            },
            "parent_tool_use_id": null,
            "session_id": session_id,
        });
        self.transport.write(&format!("{message}\n")).await
    }

    /// Next parsed message, or `None` when the stream has closed
    pub async fn next_message(&mut self) -> Option<Result<Message>> {
        self.message_rx.recv().await
    }

    /// Stream of parsed messages
    pub fn receive_messages(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        async_stream::stream! {
            while let Some(item) = self.message_rx.recv().await {
                yield item;
            }
        }
    }

    /// Drain messages until (and including) the turn's `result`
    ///
    /// # Errors
    /// Propagates the first stream error, and reports a connection error if
    /// the stream closes before a result arrives
    pub async fn receive_response(&mut self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while let Some(item) = self.message_rx.recv().await {
            let message = item?;
            let is_result = matches!(message, Message::Result { .. });
            messages.push(message);
            if is_result {
                return Ok(messages);
            }
        }
        Err(ClaudeError::connection(
            "message stream closed before a result message",
        ))
    }

    /// Interrupt the current turn
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn interrupt(&self) -> Result<()> {
        self.ensure_connected()?;
        self.engine.send_request(OutboundRequest::Interrupt).await?;
        Ok(())
    }

    /// Switch the permission mode
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn set_permission_mode(&self, mode: PermissionMode) -> Result<()> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::SetPermissionMode { mode })
            .await?;
        Ok(())
    }

    /// Switch the model; `None` clears the override
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn set_model(&self, model: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::SetModel {
                model: model.map(String::from),
            })
            .await?;
        Ok(())
    }

    /// Change the thinking-token ceiling; `None` clears it
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn set_max_thinking_tokens(&self, max_thinking_tokens: Option<u32>) -> Result<()> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::SetMaxThinkingTokens { max_thinking_tokens })
            .await?;
        Ok(())
    }

    /// Restore session files to an earlier state
    ///
    /// Returns the CLI's report of what changed (or would change, with
    /// `dry_run`).
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn rewind_files(&self, options: RewindFilesOptions) -> Result<serde_json::Value> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::RewindFiles(options))
            .await
    }

    /// Replace the MCP server set
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn mcp_set_servers(
        &self,
        servers: HashMap<String, McpServerConfig>,
    ) -> Result<serde_json::Value> {
        self.ensure_connected()?;
        let servers: serde_json::Map<String, serde_json::Value> = servers
            .iter()
            .map(|(name, cfg)| (name.clone(), cfg.to_cli_json()))
            .collect();
        self.engine
            .send_request(OutboundRequest::McpSetServers {
                servers: serde_json::Value::Object(servers),
            })
            .await
    }

    /// Reconnect MCP servers; `None` reconnects all
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn mcp_reconnect(&self, server_names: Option<Vec<String>>) -> Result<()> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::McpReconnect { server_names })
            .await?;
        Ok(())
    }

    /// Enable or disable one MCP server
    ///
    /// # Errors
    /// Returns connection, timeout, or control errors
    pub async fn mcp_toggle(&self, server_name: impl Into<String>, enabled: bool) -> Result<()> {
        self.ensure_connected()?;
        self.engine
            .send_request(OutboundRequest::McpToggle {
                server_name: server_name.into(),
                enabled,
            })
            .await?;
        Ok(())
    }

    /// Close stdin to signal end of input without tearing down
    ///
    /// # Errors
    /// Returns the pipe close error
    pub async fn end_input(&self) -> Result<()> {
        self.transport.end_input().await
    }

    /// Close the connection
    ///
    /// Cancels outstanding control requests, reaps the child, and closes
    /// the message stream. Idempotent.
    ///
    /// # Errors
    /// Returns the transport's close error
    pub async fn close(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.connected = false;
        }

        self.engine.shutdown().await;
        let result = self.transport.close().await;
        if let Some(task) = self.router_task.take() {
            task.abort();
        }
        result
    }
}

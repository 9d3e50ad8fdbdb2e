//! `ClaudeSDKClient` for bidirectional communication
//!
//! The client owns the lifecycle of one CLI child process and its control
//! engine. A single router task turns the child's stdout into three flows:
//! conversational messages (delivered here), control responses (resolved
//! against pending requests), and inbound control requests (dispatched to
//! hook, permission, and tool handlers in fresh tasks).
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      ClaudeSDKClient                       │
//! │                                                            │
//! │   send / set_model / interrupt ──► ControlProtocol ──┐     │
//! │                                                      ▼     │
//! │   next_message ◄── router task ◄── framing ◄── SubprocessTransport
//! │                        │                             ▲     │
//! │                        └── dispatch tasks ───────────┘     │
//! │                            (hooks, permissions, tools)     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes from every producer funnel through the transport's single write
//! mutex; the router never blocks on a handler.
//!
//! # Example
//!
//! ```no_run
//! use claude_code_client::{ClaudeAgentOptions, ClaudeSDKClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::default();
//! let mut client = ClaudeSDKClient::connect(options, None).await?;
//!
//! client.send_user_message("Hello, Claude!", None).await?;
//! for message in client.receive_response().await? {
//!     log::info!("{message:?}");
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

mod client_impl;
mod tasks;

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::control::ControlProtocol;
use crate::error::Result;
use crate::transport::SubprocessTransport;
use crate::types::identifiers::SessionId;
use crate::types::messages::Message;

/// Metadata returned by the `initialize` round-trip
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    /// Commands the CLI supports
    #[serde(default)]
    pub commands: Vec<serde_json::Value>,
    /// Models the account may use
    #[serde(default)]
    pub models: Vec<serde_json::Value>,
    /// Account information
    #[serde(default)]
    pub account: Option<serde_json::Value>,
    /// Active output style
    #[serde(default)]
    pub output_style: Option<String>,
    /// Available output styles
    #[serde(default)]
    pub available_output_styles: Vec<String>,
}

/// Connection state, guarded by one lock shared with `close`
#[derive(Debug, Default)]
pub(crate) struct ConnectionState {
    pub(crate) connected: bool,
    pub(crate) closed: bool,
    pub(crate) session_id: Option<SessionId>,
    pub(crate) server_info: Option<ServerInfo>,
}

/// Client for stateful bidirectional conversations with the CLI
///
/// Created by [`ClaudeSDKClient::connect`], which spawns the child in
/// streaming mode and performs the `initialize` handshake. All control
/// operations require the connection to be live; after [`close`] (or child
/// death) they fail with a connection error.
///
/// [`close`]: ClaudeSDKClient::close
pub struct ClaudeSDKClient {
    pub(crate) transport: Arc<SubprocessTransport>,
    pub(crate) engine: Arc<ControlProtocol<SubprocessTransport>>,
    pub(crate) message_rx: mpsc::UnboundedReceiver<Result<Message>>,
    pub(crate) state: Arc<parking_lot::Mutex<ConnectionState>>,
    pub(crate) router_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ClaudeSDKClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeSDKClient").finish_non_exhaustive()
    }
}

impl Drop for ClaudeSDKClient {
    fn drop(&mut self) {
        if let Some(task) = self.router_task.take() {
            task.abort();
        }
    }
}

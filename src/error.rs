//! Error types for the Claude Code client

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Claude Code client
#[derive(Error, Debug)]
pub enum ClaudeError {
    /// Claude Code CLI not found in any of the searched locations
    #[error("Claude Code CLI not found (searched {})", format_searched_paths(.searched_paths))]
    CliNotFound {
        /// Every path that was probed, in precedence order
        searched_paths: Vec<PathBuf>,
    },

    /// Installed CLI is older than the minimum supported version
    #[error("Claude Code CLI version {installed} is older than minimum supported {minimum}")]
    CliVersion {
        /// Version reported by the installed CLI
        installed: String,
        /// Minimum version this client supports
        minimum: String,
    },

    /// Connection error when spawning or talking to the CLI process
    #[error("Connection error: {0}")]
    Connection(String),

    /// Process exited with a failure status
    #[error("Process error (exit code {exit_code}): {message}")]
    Process {
        /// Error message
        message: String,
        /// Process exit code
        exit_code: i32,
        /// Captured standard error output, when available
        stderr: Option<String>,
    },

    /// A complete stdout line failed to decode as JSON
    #[error("JSON decode error: {message}")]
    JsonDecode {
        /// Decode failure description
        message: String,
        /// The offending line
        line: String,
    },

    /// The framing accumulator exceeded its byte limit
    #[error("JSON message exceeded maximum buffer size of {limit} bytes")]
    BufferOverflow {
        /// Configured byte limit
        limit: usize,
    },

    /// A decoded envelope could not be parsed into a typed message
    #[error("Message parse error: {message}")]
    MessageParse {
        /// Error message
        message: String,
        /// Raw message data that failed to parse
        data: Option<serde_json::Value>,
    },

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Control protocol error
    #[error("Control protocol error: {0}")]
    ControlProtocol(String),

    /// Hook execution error
    #[error("Hook error: {0}")]
    Hook(String),

    /// In-process tool server error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON encode error: {0}")]
    JsonEncode(#[from] serde_json::Error),

    /// A control request exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The operation was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Invalid option combination or value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClaudeError>;

fn format_searched_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no candidate paths".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ClaudeError {
    /// Create a CLI-not-found error carrying the searched paths
    #[must_use]
    pub fn cli_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::CliNotFound { searched_paths }
    }

    /// Create a version-gate error
    pub fn cli_version(installed: impl Into<String>, minimum: impl Into<String>) -> Self {
        Self::CliVersion {
            installed: installed.into(),
            minimum: minimum.into(),
        }
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a process error
    pub fn process(msg: impl Into<String>, exit_code: i32, stderr: Option<String>) -> Self {
        Self::Process {
            message: msg.into(),
            exit_code,
            stderr,
        }
    }

    /// Create a JSON decode error for a complete line
    pub fn json_decode(msg: impl Into<String>, line: impl Into<String>) -> Self {
        Self::JsonDecode {
            message: msg.into(),
            line: line.into(),
        }
    }

    /// Create a message parse error
    pub fn message_parse(msg: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::MessageParse {
            message: msg.into(),
            data,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a control protocol error
    pub fn control_protocol(msg: impl Into<String>) -> Self {
        Self::ControlProtocol(msg.into())
    }

    /// Create a hook error
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Create an in-process tool server error
    pub fn mcp(msg: impl Into<String>) -> Self {
        Self::Mcp(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

//! Subprocess transport: process handle, CLI discovery, write path

use std::env;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::Transport;
use crate::error::{ClaudeError, Result};
use crate::types::options::ClaudeAgentOptions;

use super::config::{CLI_PATH_ENV, DEFAULT_MAX_BUFFER_SIZE, PromptInput};

/// State guarded by the transport's state lock
///
/// Never held across an await; the child handle lives in its own async
/// mutex because reaping awaits.
#[derive(Default)]
pub(super) struct TransportState {
    pub(super) ready: bool,
    pub(super) closed: bool,
    pub(super) reader_task: Option<JoinHandle<()>>,
    pub(super) stderr_task: Option<JoinHandle<()>>,
    pub(super) message_rx: Option<mpsc::UnboundedReceiver<Result<serde_json::Value>>>,
    pub(super) temp_files: Vec<PathBuf>,
}

/// Subprocess transport for the Claude Code CLI
pub struct SubprocessTransport {
    pub(super) prompt: PromptInput,
    pub(super) options: ClaudeAgentOptions,
    pub(super) cli_path: PathBuf,
    pub(super) max_buffer_size: usize,
    /// The write mutex; every stdin write and close serializes here, and the
    /// ready check happens only after this lock is held
    pub(super) stdin: Arc<Mutex<Option<ChildStdin>>>,
    pub(super) child: Arc<Mutex<Option<Child>>>,
    pub(super) state: Arc<parking_lot::Mutex<TransportState>>,
    pub(super) exit_status: Arc<parking_lot::Mutex<Option<ExitStatus>>>,
}

impl SubprocessTransport {
    /// Create a new subprocess transport
    ///
    /// # Arguments
    /// * `prompt` - One-shot prompt or streaming mode
    /// * `options` - Configuration options
    /// * `cli_path` - Explicit CLI path; searched for when `None`
    ///
    /// # Errors
    /// Returns `ClaudeError::CliNotFound` when no executable can be located
    pub fn new(
        prompt: PromptInput,
        options: ClaudeAgentOptions,
        cli_path: Option<PathBuf>,
    ) -> Result<Self> {
        let cli_path = match cli_path {
            Some(path) => path,
            None => Self::find_cli()?,
        };
        let max_buffer_size = options.max_buffer_size.unwrap_or(DEFAULT_MAX_BUFFER_SIZE);

        Ok(Self {
            prompt,
            options,
            cli_path,
            max_buffer_size,
            stdin: Arc::new(Mutex::new(None)),
            child: Arc::new(Mutex::new(None)),
            state: Arc::new(parking_lot::Mutex::new(TransportState::default())),
            exit_status: Arc::new(parking_lot::Mutex::new(None)),
        })
    }

    /// Locate the Claude Code CLI
    ///
    /// Precedence: `CLAUDE_CODE_CLI_PATH`, the bundled install location,
    /// PATH, then well-known install directories.
    ///
    /// # Errors
    /// Returns `ClaudeError::CliNotFound` carrying every searched path
    pub fn find_cli() -> Result<PathBuf> {
        let mut searched = Vec::new();

        if let Ok(override_path) = env::var(CLI_PATH_ENV) {
            let path = PathBuf::from(override_path);
            if path.is_file() {
                return Ok(path);
            }
            searched.push(path);
        }

        let home = env::var("HOME").map(PathBuf::from).ok();

        if let Some(ref home) = home {
            let bundled = home.join(".claude/local/claude");
            if bundled.is_file() {
                return Ok(bundled);
            }
            searched.push(bundled);
        }

        match which::which("claude") {
            Ok(path) => return Ok(path),
            Err(_) => searched.push(PathBuf::from("claude (PATH)")),
        }

        let mut candidates = Vec::new();
        if let Some(ref home) = home {
            candidates.push(home.join(".npm-global/bin/claude"));
            candidates.push(home.join(".local/bin/claude"));
            candidates.push(home.join("node_modules/.bin/claude"));
            candidates.push(home.join(".yarn/bin/claude"));
        }
        candidates.push(PathBuf::from("/usr/local/bin/claude"));

        for path in candidates {
            if path.is_file() {
                return Ok(path);
            }
            searched.push(path);
        }

        Err(ClaudeError::cli_not_found(searched))
    }

    /// Exit status of the child, once it has been reaped
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        *self.exit_status.lock()
    }

    /// Exit error of the child, if it exited with a failure status
    #[must_use]
    pub fn exit_error(&self) -> Option<ClaudeError> {
        self.exit_status().and_then(|status| {
            if status.success() {
                None
            } else {
                Some(ClaudeError::process(
                    "CLI exited with a failure status",
                    status.code().unwrap_or(-1),
                    None,
                ))
            }
        })
    }
}

impl Transport for SubprocessTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_impl().await
    }

    async fn write(&self, data: &str) -> Result<()> {
        // Write mutex first; the ready check below is gated by it so close
        // cannot slip between the check and the write.
        let mut stdin = self.stdin.lock().await;

        if !self.is_ready() {
            return Err(ClaudeError::transport("transport is not ready for writing"));
        }

        let stdin = stdin
            .as_mut()
            .ok_or_else(|| ClaudeError::transport("stdin not available"))?;

        stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| ClaudeError::transport(format!("failed to write to stdin: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| ClaudeError::transport(format!("failed to flush stdin: {e}")))?;

        Ok(())
    }

    async fn end_input(&self) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        if let Some(mut stdin) = stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| ClaudeError::transport(format!("failed to close stdin: {e}")))?;
        }
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        let mut state = self.state.lock();
        state.message_rx.take().unwrap_or_else(|| {
            // Not connected, or the receiver was already taken; hand back a
            // channel that reports the misuse once and closes.
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(Err(ClaudeError::connection(
                "message stream not available - transport not connected",
            )));
            rx
        })
    }

    fn is_ready(&self) -> bool {
        let state = self.state.lock();
        state.ready && !state.closed
    }

    async fn close(&self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for SubprocessTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}

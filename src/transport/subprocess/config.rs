//! Configuration constants and environment assembly for the subprocess transport

use std::collections::HashMap;
use std::time::Duration;

/// Default maximum accumulated bytes per inbound JSON message (1 MiB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// How long to wait for the child to exit after stdin closes before killing it
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the version gate waits for `--version` output
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Environment variable that disables the version gate
pub const SKIP_VERSION_CHECK_ENV: &str = "CLAUDE_SDK_SKIP_VERSION_CHECK";

/// Environment variable overriding the CLI executable path
pub const CLI_PATH_ENV: &str = "CLAUDE_CODE_CLI_PATH";

/// Platform argv budget; blobs are spilled to files past this
#[cfg(windows)]
pub const MAX_COMMAND_LENGTH: usize = 8_191;
/// Platform argv budget; blobs are spilled to files past this
#[cfg(not(windows))]
pub const MAX_COMMAND_LENGTH: usize = 128 * 1024;

/// Prompt input mode
#[derive(Debug, Clone)]
pub enum PromptInput {
    /// Single prompt passed on argv; stdin closes right after spawn
    String(String),
    /// User turns stream in over stdin as JSON lines
    Stream,
}

impl From<String> for PromptInput {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for PromptInput {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Variables the child always gets, regardless of caller input
///
/// Terminal quieting keeps the CLI from emitting color codes or paging;
/// the entrypoint and version tags identify this client to the CLI.
fn forced_environment(partial_messages: bool) -> Vec<(&'static str, String)> {
    let mut forced = vec![
        ("TERM", "dumb".to_string()),
        ("NO_COLOR", "1".to_string()),
        ("CLAUDE_CODE_ENTRYPOINT", "sdk-rust".to_string()),
        ("CLAUDE_AGENT_SDK_VERSION", crate::VERSION.to_string()),
    ];
    if partial_messages {
        forced.push(("CLAUDE_AGENT_SDK_PARTIAL_MESSAGES", "1".to_string()));
    }
    forced
}

/// Build the child's environment
///
/// Layered as `os-environ ⨁ forced ⨁ user ⨁ forced`: callers may override
/// ordinary system variables, but never the forced set.
#[must_use]
pub fn build_environment(
    user_env: &HashMap<String, String>,
    partial_messages: bool,
) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    for (key, value) in forced_environment(partial_messages) {
        env.insert(key.to_string(), value);
    }
    for (key, value) in user_env {
        env.insert(key.clone(), value.clone());
    }
    for (key, value) in forced_environment(partial_messages) {
        env.insert(key.to_string(), value);
    }
    env
}

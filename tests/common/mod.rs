//! Shared fixtures: fake CLI children implemented as shell scripts
//!
//! Each script answers `--version` so the transport's version gate sees a
//! supported CLI, then runs the scenario body. Scripts that need to expose
//! what they received on stdin append every line to the file named by the
//! `FAKE_CLI_LOG` environment variable.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Write an executable fake-CLI script into `dir`
pub fn write_fake_cli(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-claude");
    let script = format!(
        "#!/usr/bin/env bash\n\
         if [ \"$1\" = \"--version\" ]; then echo \"2.0.0 (Claude Code)\"; exit 0; fi\n\
         {body}\n"
    );
    std::fs::write(&path, script).expect("write fake CLI");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake CLI");
    }
    path
}

/// Streaming fake CLI: logs stdin, answers `initialize`, echoes user turns
///
/// Every received line is appended to `$FAKE_CLI_LOG`. Each control request
/// is acknowledged with a success response carrying the test session ID, and
/// each user turn produces one assistant message plus one result.
pub const STREAMING_ECHO: &str = r#"
echo '{"type":"system","subtype":"init","session_id":"test_session_123","version":"2.0.0"}'
while IFS= read -r line; do
  if [ -n "$FAKE_CLI_LOG" ]; then printf '%s\n' "$line" >> "$FAKE_CLI_LOG"; fi
  case "$line" in
    *'"type":"control_request"'*)
      rid="${line#*\"request_id\":\"}"; rid="${rid%%\"*}"
      printf '{"type":"control_response","response":{"subtype":"success","request_id":"%s","response":{"session_id":"test_session_123","commands":[],"output_style":"default"}}}\n' "$rid"
      ;;
    *'"type":"user"'*)
      printf '{"type":"assistant","message":{"content":[{"type":"text","text":"Echo"}],"model":"claude-test"},"session_id":"test_session_123"}\n'
      printf '{"type":"result","subtype":"success","duration_ms":5,"duration_api_ms":3,"is_error":false,"num_turns":1,"session_id":"test_session_123"}\n'
      ;;
  esac
done
"#;

/// Streaming fake CLI that asks a permission question right after init
///
/// After acknowledging `initialize` it sends a `can_use_tool` control
/// request for `Bash`; the client's reply lands in the log like every other
/// received line.
pub const PERMISSION_PROBE: &str = r#"
while IFS= read -r line; do
  if [ -n "$FAKE_CLI_LOG" ]; then printf '%s\n' "$line" >> "$FAKE_CLI_LOG"; fi
  case "$line" in
    *'"subtype":"initialize"'*)
      rid="${line#*\"request_id\":\"}"; rid="${rid%%\"*}"
      printf '{"type":"control_response","response":{"subtype":"success","request_id":"%s","response":{"session_id":"test_session_123"}}}\n' "$rid"
      printf '{"type":"control_request","request_id":"srv_req_1","request":{"subtype":"can_use_tool","tool_name":"Bash","input":{"command":"ls"},"tool_use_id":"toolu_01"}}\n'
      ;;
  esac
done
"#;

/// Poll `log` until `predicate` matches a line or `timeout` passes
pub async fn wait_for_log_line(
    log: &Path,
    timeout: Duration,
    predicate: impl Fn(&str) -> bool,
) -> Option<String> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(contents) = std::fs::read_to_string(log)
            && let Some(line) = contents.lines().find(|line| predicate(line))
        {
            return Some(line.to_string());
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Lines of the fake CLI's stdin log
pub fn log_lines(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|contents| contents.lines().map(String::from).collect())
        .unwrap_or_default()
}

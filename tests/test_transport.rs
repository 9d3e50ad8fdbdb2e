//! Transport tests: one-shot scenario, environment discipline, version
//! calibration, CLI discovery errors, close idempotency

mod common;

use std::collections::HashMap;

use claude_code_client::transport::subprocess::{
    CliVersion, MIN_CLI_VERSION, build_environment, extract_version,
};
use claude_code_client::{
    ClaudeAgentOptions, ClaudeError, Message, PromptInput, SubprocessTransport, SystemMessage,
    Transport, query,
};

// ============================================================================
// S1: one-shot success against a scripted child
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn one_shot_collects_three_messages_in_order() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let cli = common::write_fake_cli(
        dir.path(),
        r#"
echo '{"type":"system","subtype":"init","data":{"version":"2.0.0"}}'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"Hello!"}],"model":"claude-test"}}'
echo '{"type":"result","subtype":"success","duration_ms":100,"is_error":false}'
"#,
    );

    let messages = query("hi", None, Some(cli)).await?;

    assert_eq!(messages.len(), 3);
    assert!(matches!(
        messages[0],
        Message::System(SystemMessage::Init { .. })
    ));
    let Message::Assistant { ref message, .. } = messages[1] else {
        panic!("expected assistant message, got {:?}", messages[1]);
    };
    assert_eq!(message.model, "claude-test");
    assert!(messages[2].is_success());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn one_shot_with_failing_child_reports_the_exit() {
    let dir = tempfile::tempdir().unwrap();
    let cli = common::write_fake_cli(dir.path(), "exit 7");

    let err = query("hi", None, Some(cli)).await.unwrap_err();
    match err {
        ClaudeError::Process { exit_code, .. } => assert_eq!(exit_code, 7),
        ClaudeError::Connection(_) => {} // reaped by close before the reader saw it
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Environment discipline
// ============================================================================

#[test]
fn forced_variables_survive_override_attempts() {
    let mut user_env = HashMap::new();
    user_env.insert("TERM".to_string(), "xterm-256color".to_string());
    user_env.insert("NO_COLOR".to_string(), "".to_string());
    user_env.insert("CLAUDE_CODE_ENTRYPOINT".to_string(), "evil".to_string());
    user_env.insert("MY_APP_FLAG".to_string(), "on".to_string());

    let env = build_environment(&user_env, false);

    assert_eq!(env["TERM"], "dumb");
    assert_eq!(env["NO_COLOR"], "1");
    assert_eq!(env["CLAUDE_CODE_ENTRYPOINT"], "sdk-rust");
    assert_eq!(env["CLAUDE_AGENT_SDK_VERSION"], claude_code_client::VERSION);
    assert_eq!(env["MY_APP_FLAG"], "on");
    assert!(!env.contains_key("CLAUDE_AGENT_SDK_PARTIAL_MESSAGES"));
}

#[test]
fn feature_flags_appear_when_enabled() {
    let env = build_environment(&HashMap::new(), true);
    assert_eq!(env["CLAUDE_AGENT_SDK_PARTIAL_MESSAGES"], "1");
}

#[test]
fn user_variables_override_system_variables() {
    // PATH is in every test environment and is not part of the forced set.
    let mut user_env = HashMap::new();
    user_env.insert("PATH".to_string(), "/custom/bin".to_string());

    let env = build_environment(&user_env, false);
    assert_eq!(env["PATH"], "/custom/bin");
}

// ============================================================================
// Version calibration
// ============================================================================

#[test]
fn version_comparison_calibration_cases() {
    let v = |s: &str| CliVersion::parse(s).expect(s);
    assert!(v("1.2.3").is_at_least(&v("1.2.3")));
    assert!(!v("1.2.0").is_at_least(&v("1.2.3")));
    assert!(v("2.0.0").is_at_least(&v("1.9.9")));
    assert!(CliVersion::parse("1.2.x").is_none());
}

#[test]
fn version_extraction_tolerates_surrounding_text() {
    assert_eq!(
        extract_version("2.0.0 (Claude Code)").unwrap(),
        CliVersion::parse("2.0.0").unwrap()
    );
    assert_eq!(
        extract_version("claude version v1.2.3!").map(|v| v.to_string()),
        None,
        "a trailing bang makes the token implausible"
    );
    assert!(extract_version("").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn version_gate_rejects_an_old_cli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake-claude");
    std::fs::write(&path, "#!/usr/bin/env bash\necho \"0.0.1\"\n").unwrap();
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut transport = SubprocessTransport::new(
        PromptInput::Stream,
        ClaudeAgentOptions::default(),
        Some(path),
    )
    .unwrap();
    let err = transport.connect().await.unwrap_err();
    let ClaudeError::CliVersion { installed, minimum } = err else {
        panic!("expected CliVersion, got {err:?}");
    };
    assert_eq!(installed, "0.0.1");
    assert_eq!(minimum, MIN_CLI_VERSION.to_string());
}

// ============================================================================
// Discovery and close
// ============================================================================

#[test]
fn cli_not_found_reports_the_searched_paths() {
    let err = ClaudeError::cli_not_found(vec![
        "/usr/local/bin/claude".into(),
        "/home/user/.local/bin/claude".into(),
    ]);
    let rendered = err.to_string();
    assert!(rendered.contains("/usr/local/bin/claude"));
    assert!(rendered.contains("/home/user/.local/bin/claude"));
}

#[cfg(unix)]
#[tokio::test]
async fn close_is_idempotent_and_rejects_later_writes() {
    let dir = tempfile::tempdir().unwrap();
    let cli = common::write_fake_cli(dir.path(), common::STREAMING_ECHO);

    let mut transport = SubprocessTransport::new(
        PromptInput::Stream,
        ClaudeAgentOptions::default(),
        Some(cli),
    )
    .unwrap();
    transport.connect().await.unwrap();
    assert!(transport.is_ready());

    transport.close().await.unwrap();
    transport.close().await.unwrap();
    transport.close().await.unwrap();

    assert!(!transport.is_ready());
    let err = transport.write("{}\n").await.unwrap_err();
    assert!(matches!(err, ClaudeError::Transport(_)));
    assert!(transport.exit_status().is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn concurrent_close_calls_all_return_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let cli = common::write_fake_cli(dir.path(), common::STREAMING_ECHO);

    let mut transport = SubprocessTransport::new(
        PromptInput::Stream,
        ClaudeAgentOptions::default(),
        Some(cli),
    )
    .unwrap();
    transport.connect().await.unwrap();
    let transport = std::sync::Arc::new(transport);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let transport = std::sync::Arc::clone(&transport);
        handles.push(tokio::spawn(async move { transport.close().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert!(!transport.is_ready());
}

// ============================================================================
// Write serialization
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn concurrent_writers_never_interleave_mid_message() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("stdin.log");
    let cli = common::write_fake_cli(dir.path(), common::STREAMING_ECHO);

    let options = ClaudeAgentOptions::builder()
        .env_var("FAKE_CLI_LOG", log.to_string_lossy())
        .build();
    let mut transport =
        SubprocessTransport::new(PromptInput::Stream, options, Some(cli)).unwrap();
    transport.connect().await.unwrap();
    let transport = std::sync::Arc::new(transport);

    let mut handles = Vec::new();
    for writer in 0..4 {
        let transport = std::sync::Arc::clone(&transport);
        handles.push(tokio::spawn(async move {
            for n in 0..25 {
                let line = format!("{{\"type\":\"noise\",\"writer\":{writer},\"n\":{n}}}\n");
                transport.write(&line).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Give the child a moment to drain its stdin into the log.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    while common::log_lines(&log).len() < 100 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let lines = common::log_lines(&log);
    assert_eq!(lines.len(), 100, "expected every message exactly once");
    for line in &lines {
        let value: serde_json::Value =
            serde_json::from_str(line).expect("no message was interleaved mid-JSON");
        assert_eq!(value["type"], "noise");
    }

    transport.close().await.unwrap();
}

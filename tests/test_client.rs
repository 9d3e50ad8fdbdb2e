//! Client facade tests against scripted CLI children: the initialize
//! round-trip, streaming echo, set-model wire shapes, and the permission
//! callback loop

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use claude_code_client::permissions::permission_callback;
use claude_code_client::{
    ClaudeAgentOptions, ClaudeError, ClaudeSDKClient, Message, PermissionResult,
};

fn streaming_fixture(
    dir: &tempfile::TempDir,
    script: &str,
) -> (std::path::PathBuf, std::path::PathBuf) {
    let log = dir.path().join("stdin.log");
    let cli = common::write_fake_cli(dir.path(), script);
    (cli, log)
}

fn logging_options(log: &std::path::Path) -> ClaudeAgentOptions {
    let _ = env_logger::builder().is_test(true).try_init();
    ClaudeAgentOptions::builder()
        .env_var("FAKE_CLI_LOG", log.to_string_lossy())
        .build()
}

#[tokio::test]
async fn initialize_round_trip_surfaces_the_session_id() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, log) = streaming_fixture(&dir, common::STREAMING_ECHO);

    let mut client = ClaudeSDKClient::connect(logging_options(&log), Some(cli))
        .await
        .unwrap();

    assert!(client.is_connected());
    assert_eq!(client.session_id().unwrap().as_str(), "test_session_123");
    assert_eq!(
        client.server_info().unwrap().output_style.as_deref(),
        Some("default")
    );

    // Exactly one initialize request went over the wire.
    let init_lines: Vec<String> = common::log_lines(&log)
        .into_iter()
        .filter(|line| line.contains(r#""subtype":"initialize""#))
        .collect();
    assert_eq!(init_lines.len(), 1);

    client.close().await.unwrap();
}

#[tokio::test]
async fn streaming_echo_yields_one_assistant_and_one_result() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, log) = streaming_fixture(&dir, common::STREAMING_ECHO);

    let mut client = ClaudeSDKClient::connect(logging_options(&log), Some(cli))
        .await
        .unwrap();

    client.send_user_message("ping", None).await.unwrap();
    let messages = client.receive_response().await.unwrap();

    let assistants = messages
        .iter()
        .filter(|m| matches!(m, Message::Assistant { .. }))
        .count();
    assert_eq!(assistants, 1);
    assert!(messages.last().unwrap().is_success());

    // The user turn carried the wire shape the CLI expects.
    let user_line = common::wait_for_log_line(&log, Duration::from_secs(2), |line| {
        line.contains(r#""type":"user""#)
    })
    .await
    .expect("user turn reached the child");
    let value: serde_json::Value = serde_json::from_str(&user_line).unwrap();
    assert_eq!(value["message"]["role"], "user");
    assert_eq!(value["message"]["content"], "ping");
    assert_eq!(value["session_id"], "test_session_123");
    assert!(value["parent_tool_use_id"].is_null());

    client.close().await.unwrap();
}

#[tokio::test]
async fn set_model_emits_the_field_only_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, log) = streaming_fixture(&dir, common::STREAMING_ECHO);

    let mut client = ClaudeSDKClient::connect(logging_options(&log), Some(cli))
        .await
        .unwrap();

    client.set_model(Some("claude-opus-4")).await.unwrap();
    client.set_model(None).await.unwrap();
    client.close().await.unwrap();

    let set_model_lines: Vec<serde_json::Value> = common::log_lines(&log)
        .iter()
        .filter(|line| line.contains(r#""subtype":"set_model""#))
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(set_model_lines.len(), 2);

    assert_eq!(set_model_lines[0]["request"]["model"], "claude-opus-4");
    assert!(
        !set_model_lines[1]["request"]
            .as_object()
            .unwrap()
            .contains_key("model"),
        "clearing the model must omit the field"
    );
}

#[tokio::test]
async fn permission_callback_answers_can_use_tool_with_allow() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, log) = streaming_fixture(&dir, common::PERMISSION_PROBE);

    let seen: Arc<parking_lot::Mutex<Option<(String, serde_json::Value)>>> =
        Arc::new(parking_lot::Mutex::new(None));
    let seen_in_callback = Arc::clone(&seen);

    let options = ClaudeAgentOptions::builder()
        .env_var("FAKE_CLI_LOG", log.to_string_lossy())
        .can_use_tool(permission_callback(move |tool_name, input, _context| {
            let seen = Arc::clone(&seen_in_callback);
            async move {
                *seen.lock() = Some((tool_name.as_str().to_string(), input));
                Ok(PermissionResult::allow())
            }
        }))
        .build();

    let mut client = ClaudeSDKClient::connect(options, Some(cli)).await.unwrap();

    // The child probes right after init; its request is answered by the
    // callback and the reply lands in the child's stdin log.
    let reply = common::wait_for_log_line(&log, Duration::from_secs(5), |line| {
        line.contains(r#""request_id":"srv_req_1""#)
    })
    .await
    .expect("control_response reached the child");

    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["type"], "control_response");
    assert_eq!(value["response"]["subtype"], "success");
    assert_eq!(value["response"]["response"]["behavior"], "allow");

    let (tool_name, input) = seen.lock().clone().expect("callback was invoked");
    assert_eq!(tool_name, "Bash");
    assert_eq!(input["command"], "ls");

    client.close().await.unwrap();
}

#[tokio::test]
async fn inbound_control_request_without_handler_gets_an_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    // No can_use_tool callback configured; the probe must get an error back.
    let (cli, log) = streaming_fixture(&dir, common::PERMISSION_PROBE);

    let mut client = ClaudeSDKClient::connect(logging_options(&log), Some(cli))
        .await
        .unwrap();

    let reply = common::wait_for_log_line(&log, Duration::from_secs(5), |line| {
        line.contains(r#""request_id":"srv_req_1""#)
    })
    .await
    .expect("error reply reached the child");

    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(value["response"]["subtype"], "error");
    assert!(value["response"]["error"].as_str().unwrap().contains("permission"));

    // The failed dispatch did not tear the connection down.
    assert!(client.is_connected());
    client.close().await.unwrap();
}

#[tokio::test]
async fn operations_after_close_fail_with_connection_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (cli, log) = streaming_fixture(&dir, common::STREAMING_ECHO);

    let mut client = ClaudeSDKClient::connect(logging_options(&log), Some(cli))
        .await
        .unwrap();
    client.close().await.unwrap();
    client.close().await.unwrap();

    assert!(!client.is_connected());
    assert!(matches!(
        client.send_user_message("late", None).await,
        Err(ClaudeError::Connection(_))
    ));
    assert!(matches!(
        client.interrupt().await,
        Err(ClaudeError::Connection(_))
    ));
    assert!(matches!(
        client.set_model(Some("m")).await,
        Err(ClaudeError::Connection(_))
    ));
}

#[tokio::test]
async fn validation_failures_surface_before_any_spawn() {
    let options = ClaudeAgentOptions {
        continue_conversation: true,
        resume: Some("sess".into()),
        ..Default::default()
    };
    let err = ClaudeSDKClient::connect(options, Some("/nonexistent/claude".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::InvalidConfig(_)));
}

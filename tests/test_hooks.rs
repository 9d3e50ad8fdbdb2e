//! Hook registry tests: registration payload, dispatch, timeouts

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use claude_code_client::hooks::{HookMatcherBuilder, hook_callback};
use claude_code_client::{ClaudeError, HookEvent, HookOutput, HookRegistry};
use tokio_util::sync::CancellationToken;

fn registry_with_one_bash_hook() -> (HookRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_hook = Arc::clone(&calls);

    let hook = hook_callback(move |_input, _tool_use_id, _context| {
        let calls = Arc::clone(&calls_in_hook);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(HookOutput {
                system_message: Some("observed".to_string()),
                ..HookOutput::default()
            })
        }
    });

    let mut hooks = HashMap::new();
    hooks.insert(
        HookEvent::PreToolUse,
        vec![HookMatcherBuilder::new(Some("Bash")).add_hook(hook).build()],
    );
    (HookRegistry::new(Some(&hooks)), calls)
}

#[test]
fn empty_registry_renders_no_payload() {
    let registry = HookRegistry::new(None);
    assert!(registry.is_empty());
    assert!(registry.init_payload().is_none());
}

#[test]
fn init_payload_carries_matcher_callback_ids_and_timeout() {
    let hook = hook_callback(|_input, _tool_use_id, _context| async move {
        Ok(HookOutput::default())
    });
    let mut hooks = HashMap::new();
    hooks.insert(
        HookEvent::PreToolUse,
        vec![
            HookMatcherBuilder::new(Some("Write|Edit"))
                .add_hook(hook.clone())
                .add_hook(hook.clone())
                .timeout(30.0)
                .build(),
        ],
    );
    hooks.insert(
        HookEvent::SessionStart,
        vec![HookMatcherBuilder::new(None::<String>).add_hook(hook).build()],
    );

    let registry = HookRegistry::new(Some(&hooks));
    let payload = registry.init_payload().unwrap();

    let pre_tool_use = payload["PreToolUse"].as_array().unwrap();
    assert_eq!(pre_tool_use.len(), 1);
    assert_eq!(pre_tool_use[0]["matcher"], "Write|Edit");
    assert_eq!(pre_tool_use[0]["timeout"], 30.0);
    let ids = pre_tool_use[0]["hookCallbackIds"].as_array().unwrap();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    for id in ids {
        assert!(id.as_str().unwrap().starts_with("hook_"));
    }

    let session_start = payload["SessionStart"].as_array().unwrap();
    assert!(session_start[0].get("matcher").is_none());
    assert!(session_start[0].get("timeout").is_none());
}

#[tokio::test]
async fn dispatch_invokes_the_registered_callback() {
    let (registry, calls) = registry_with_one_bash_hook();
    let payload = registry.init_payload().unwrap();
    let id = payload["PreToolUse"][0]["hookCallbackIds"][0]
        .as_str()
        .unwrap()
        .to_string();

    let output = registry
        .dispatch(
            &id,
            serde_json::json!({"tool_name": "Bash", "tool_input": {"command": "ls"}}),
            Some("toolu_01".to_string()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.system_message.as_deref(), Some("observed"));
}

#[tokio::test]
async fn dispatch_of_an_unknown_id_is_a_hook_error() {
    let (registry, _calls) = registry_with_one_bash_hook();
    let err = registry
        .dispatch(
            "hook_does_not_exist",
            serde_json::json!({}),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Hook(_)));
}

#[tokio::test]
async fn slow_callback_times_out_and_cancels_its_context() {
    let cancelled = Arc::new(AtomicUsize::new(0));
    let cancelled_in_hook = Arc::clone(&cancelled);

    let hook = hook_callback(move |_input, _tool_use_id, context| {
        let cancelled = Arc::clone(&cancelled_in_hook);
        async move {
            context.signal.cancelled().await;
            cancelled.fetch_add(1, Ordering::SeqCst);
            Ok(HookOutput::default())
        }
    });
    let mut hooks = HashMap::new();
    hooks.insert(
        HookEvent::PreToolUse,
        vec![
            HookMatcherBuilder::new(Some("Bash"))
                .add_hook(hook)
                .timeout(0.05)
                .build(),
        ],
    );
    let registry = HookRegistry::new(Some(&hooks));
    let payload = registry.init_payload().unwrap();
    let id = payload["PreToolUse"][0]["hookCallbackIds"][0]
        .as_str()
        .unwrap()
        .to_string();

    let err = registry
        .dispatch(&id, serde_json::json!({}), None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Hook(_)));
}

#[test]
fn hook_output_serializes_with_wire_field_names() {
    let output = HookOutput {
        continue_: Some(false),
        stop_reason: Some("blocked".to_string()),
        system_message: Some("nope".to_string()),
        async_: Some(true),
        async_timeout: Some(2.5),
        ..HookOutput::default()
    };
    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["continue"], false);
    assert_eq!(value["stopReason"], "blocked");
    assert_eq!(value["systemMessage"], "nope");
    assert_eq!(value["async"], true);
    assert_eq!(value["asyncTimeout"], 2.5);
    assert!(value.get("decision").is_none());
}

//! Unit tests for the message parser
//!
//! Covers the taxonomy dispatch, envelope leniency, content-block rules,
//! and totality over adversarial inputs.

use claude_code_client::{ClaudeError, ContentBlock, Message, SystemMessage, parse_message};
use serde_json::{Value, json};

#[test]
fn parses_user_message_with_string_content() {
    let msg = parse_message(json!({
        "type": "user",
        "message": { "role": "user", "content": "Hello, Claude!" },
        "session_id": "s1"
    }))
    .unwrap();

    let Message::User {
        message, session_id, ..
    } = msg
    else {
        panic!("expected user message");
    };
    assert_eq!(message.role, "user");
    assert_eq!(session_id.unwrap().as_str(), "s1");
}

#[test]
fn parses_assistant_message_with_blocks() {
    let msg = parse_message(json!({
        "type": "assistant",
        "message": {
            "model": "claude-test",
            "content": [
                {"type": "text", "text": "Hello!"},
                {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                {"type": "tool_use", "id": "toolu_1", "name": "Bash", "input": {"command": "ls"}}
            ]
        }
    }))
    .unwrap();

    let Message::Assistant { message, .. } = msg else {
        panic!("expected assistant message");
    };
    assert_eq!(message.model, "claude-test");
    assert_eq!(message.content.len(), 3);
    assert!(matches!(&message.content[0], ContentBlock::Text { text } if text == "Hello!"));
}

#[test]
fn assistant_fields_may_sit_at_the_envelope_top_level() {
    let msg = parse_message(json!({
        "type": "assistant",
        "model": "claude-test",
        "content": [{"type": "text", "text": "flat"}]
    }))
    .unwrap();

    let Message::Assistant { message, .. } = msg else {
        panic!("expected assistant message");
    };
    assert_eq!(message.model, "claude-test");
    assert_eq!(message.content.len(), 1);
}

#[test]
fn unknown_blocks_are_skipped_among_valid_ones() {
    let msg = parse_message(json!({
        "type": "assistant",
        "message": {
            "model": "m",
            "content": [
                {"type": "holograph", "data": 1},
                {"type": "text", "text": "kept"}
            ]
        }
    }))
    .unwrap();

    let Message::Assistant { message, .. } = msg else {
        panic!("expected assistant message");
    };
    assert_eq!(message.content.len(), 1);
}

#[test]
fn message_with_only_invalid_blocks_fails() {
    let result = parse_message(json!({
        "type": "assistant",
        "message": {
            "model": "m",
            "content": [
                {"type": "holograph", "data": 1},
                {"type": "telepathy"}
            ]
        }
    }));

    let err = result.unwrap_err();
    let ClaudeError::MessageParse { data, .. } = err else {
        panic!("expected MessageParse, got {err:?}");
    };
    assert!(data.is_some());
}

#[test]
fn unknown_top_level_type_fails() {
    let result = parse_message(json!({"type": "carrier_pigeon", "data": "coo"}));
    assert!(matches!(result, Err(ClaudeError::MessageParse { .. })));
}

#[test]
fn system_subtypes_dispatch_to_dedicated_shapes() {
    let msg = parse_message(json!({
        "type": "system",
        "subtype": "init",
        "session_id": "s1",
        "version": "2.0.0"
    }))
    .unwrap();
    assert!(matches!(
        msg,
        Message::System(SystemMessage::Init { ref version, .. }) if version.as_deref() == Some("2.0.0")
    ));

    let msg = parse_message(json!({
        "type": "system",
        "subtype": "compact_boundary",
        "reason": "auto",
        "pre_compaction_tokens": 190000
    }))
    .unwrap();
    assert!(matches!(
        msg,
        Message::System(SystemMessage::CompactBoundary {
            pre_compaction_tokens: Some(190_000),
            ..
        })
    ));
}

#[test]
fn unknown_system_subtype_degrades_to_other() {
    let msg = parse_message(json!({
        "type": "system",
        "subtype": "lunar_phase",
        "phase": "waxing"
    }))
    .unwrap();
    let Message::System(SystemMessage::Other { subtype, data }) = msg else {
        panic!("expected Other");
    };
    assert_eq!(subtype, "lunar_phase");
    assert_eq!(data["phase"], "waxing");
}

#[test]
fn result_message_carries_metrics_and_success() {
    let msg = parse_message(json!({
        "type": "result",
        "subtype": "success",
        "duration_ms": 2500,
        "duration_api_ms": 2000,
        "is_error": false,
        "num_turns": 2,
        "session_id": "s1",
        "total_cost_usd": 0.01,
        "modelUsage": {"claude-test": {"inputTokens": 10}},
        "result": "done"
    }))
    .unwrap();

    assert!(msg.is_success());
    let Message::Result {
        duration_ms,
        model_usage,
        ..
    } = msg
    else {
        panic!("expected result");
    };
    assert_eq!(duration_ms, 2500);
    assert!(model_usage.unwrap().contains_key("claude-test"));
}

#[test]
fn error_result_is_not_success() {
    let msg = parse_message(json!({
        "type": "result",
        "subtype": "error_during_execution",
        "duration_ms": 10,
        "is_error": true
    }))
    .unwrap();
    assert!(!msg.is_success());
}

#[test]
fn result_without_subtype_fails() {
    let result = parse_message(json!({"type": "result", "duration_ms": 1}));
    assert!(result.is_err());
}

#[test]
fn nested_stream_event_is_parsed() {
    let msg = parse_message(json!({
        "type": "stream_event",
        "uuid": "u1",
        "session_id": "s1",
        "event": {"type": "content_block_delta", "index": 2, "delta": {"text": "h"}}
    }))
    .unwrap();
    let Message::StreamEvent { event, .. } = msg else {
        panic!("expected stream event");
    };
    assert_eq!(event.event_type, "content_block_delta");
    assert_eq!(event.index, Some(2));
}

#[test]
fn auxiliary_variants_parse() {
    assert!(matches!(
        parse_message(json!({"type": "auth_status", "is_authenticated": true})).unwrap(),
        Message::AuthStatus {
            is_authenticated: Some(true),
            ..
        }
    ));
    assert!(matches!(
        parse_message(json!({
            "type": "tool_progress",
            "tool_use_id": "toolu_1",
            "elapsed_time_seconds": 1.5
        }))
        .unwrap(),
        Message::ToolProgress { .. }
    ));
    assert!(matches!(
        parse_message(json!({"type": "tool_use_summary", "summary": "ran ls"})).unwrap(),
        Message::ToolUseSummary { .. }
    ));
    assert!(matches!(
        parse_message(json!({"type": "rate_limit_event", "retry_after": 30})).unwrap(),
        Message::RateLimitEvent { .. }
    ));
}

// ============================================================================
// Totality
// ============================================================================

/// Tiny deterministic generator; xorshift so runs are reproducible
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn value(&mut self, depth: u32) -> Value {
        match self.next() % if depth == 0 { 5 } else { 7 } {
            0 => Value::Null,
            1 => json!(self.next() % 1000),
            2 => json!(self.next() as i64),
            3 => json!((self.next() % 2) == 0),
            4 => json!(format!("s{}", self.next() % 100)),
            5 => {
                let len = self.next() % 4;
                Value::Array((0..len).map(|_| self.value(depth - 1)).collect())
            }
            _ => {
                let keys = ["type", "subtype", "message", "content", "model", "x"];
                let len = self.next() % 5;
                let mut map = serde_json::Map::new();
                for _ in 0..len {
                    let key = keys[(self.next() % keys.len() as u64) as usize];
                    map.insert(key.to_string(), self.value(depth - 1));
                }
                Value::Object(map)
            }
        }
    }
}

#[test]
fn parser_is_total_over_arbitrary_json() {
    let mut rng = Rng(0x1234_5678_9abc_def0);
    for _ in 0..5000 {
        let input = rng.value(3);
        // Must return a typed message or an error; must never panic.
        let _ = parse_message(input);
    }
}

#[test]
fn parser_is_total_over_known_types_with_garbage_fields() {
    let mut rng = Rng(0xdead_beef_cafe_f00d);
    let types = [
        "user",
        "assistant",
        "system",
        "result",
        "stream_event",
        "auth_status",
        "tool_progress",
        "tool_use_summary",
        "rate_limit_event",
    ];
    for _ in 0..5000 {
        let mut input = rng.value(3);
        if let Value::Object(ref mut map) = input {
            let t = types[(rng.next() % types.len() as u64) as usize];
            map.insert("type".to_string(), json!(t));
        }
        let _ = parse_message(input);
    }
}

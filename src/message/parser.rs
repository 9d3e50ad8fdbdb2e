//! Message parser for CLI responses
//!
//! [`parse_message`] is a pure function from a raw JSON envelope to a typed
//! [`Message`]. Dispatch is two-level: first on `type`, then for `system`
//! messages on `subtype`. The parser is forgiving about field location
//! (several fields may appear at the envelope top level or inside a nested
//! `message`/`event` object) and strict about content: a message whose block
//! list contains only invalid blocks fails to parse.
//!
//! The parser is total: any input yields a typed message or a
//! `ClaudeError::MessageParse`, never a panic.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::SessionId;
use crate::types::messages::{
    AssistantMessageContent, ContentBlock, Message, StreamEventBody, SystemMessage, UserContent,
    UserMessageContent,
};

/// Parse a JSON value into a typed [`Message`]
///
/// # Errors
/// Returns `ClaudeError::MessageParse` carrying the offending data when the
/// envelope is not an object, has no or an unknown `type`, or carries only
/// invalid content blocks.
pub fn parse_message(data: Value) -> Result<Message> {
    let Some(obj) = data.as_object() else {
        return Err(parse_err("message is not a JSON object", &data));
    };

    let Some(msg_type) = obj.get("type").and_then(Value::as_str) else {
        return Err(parse_err("message has no 'type' field", &data));
    };

    match msg_type {
        "user" => parse_user(obj, &data),
        "assistant" => parse_assistant(obj, &data),
        "system" => parse_system(obj, &data),
        "result" => parse_result(obj, &data),
        "stream_event" => parse_stream_event(obj, &data),
        "auth_status" => Ok(Message::AuthStatus {
            is_authenticated: opt_bool(obj, "is_authenticated"),
            error: opt_string(obj, "error"),
            data: data.clone(),
        }),
        "tool_progress" => Ok(Message::ToolProgress {
            tool_use_id: opt_string(obj, "tool_use_id"),
            tool_name: opt_string(obj, "tool_name"),
            session_id: opt_session_id(obj),
            parent_tool_use_id: opt_string(obj, "parent_tool_use_id"),
            elapsed_time_seconds: obj.get("elapsed_time_seconds").and_then(Value::as_f64),
            data: data.clone(),
        }),
        "tool_use_summary" => Ok(Message::ToolUseSummary {
            tool_use_id: opt_string(obj, "tool_use_id"),
            summary: opt_string(obj, "summary"),
            session_id: opt_session_id(obj),
            data: data.clone(),
        }),
        "rate_limit_event" => Ok(Message::RateLimitEvent { data: data.clone() }),
        other => Err(parse_err(
            format!("unknown message type: {other}"),
            &data,
        )),
    }
}

fn parse_err(msg: impl Into<String>, data: &Value) -> ClaudeError {
    ClaudeError::message_parse(msg, Some(data.clone()))
}

// ============================================================================
// Field helpers
// ============================================================================

fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

fn opt_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn opt_session_id(obj: &Map<String, Value>) -> Option<SessionId> {
    opt_string(obj, "session_id").map(SessionId::new)
}

/// Look a field up on the envelope first, then inside the nested object
fn enveloped<'a>(
    obj: &'a Map<String, Value>,
    nested: Option<&'a Map<String, Value>>,
    key: &str,
) -> Option<&'a Value> {
    obj.get(key)
        .or_else(|| nested.and_then(|inner| inner.get(key)))
}

fn enveloped_string(
    obj: &Map<String, Value>,
    nested: Option<&Map<String, Value>>,
    key: &str,
) -> Option<String> {
    enveloped(obj, nested, key)
        .and_then(Value::as_str)
        .map(String::from)
}

// ============================================================================
// Content blocks
// ============================================================================

/// Parse one content block; `None` means skip it
fn parse_block(value: &Value) -> Option<ContentBlock> {
    let obj = value.as_object()?;
    match obj.get("type").and_then(Value::as_str)? {
        "text" => Some(ContentBlock::Text {
            text: opt_string(obj, "text")?,
        }),
        "thinking" => Some(ContentBlock::Thinking {
            thinking: opt_string(obj, "thinking")?,
            signature: opt_string(obj, "signature"),
        }),
        "tool_use" => Some(ContentBlock::ToolUse {
            id: opt_string(obj, "id")?,
            name: opt_string(obj, "name")?,
            input: obj.get("input").cloned().unwrap_or_else(|| Value::Object(Map::new())),
        }),
        "tool_result" => Some(ContentBlock::ToolResult {
            tool_use_id: opt_string(obj, "tool_use_id")?,
            content: obj.get("content").and_then(normalize_tool_result_content),
            is_error: opt_bool(obj, "is_error"),
        }),
        other => {
            log::debug!("skipping unknown content block type: {other}");
            None
        }
    }
}

/// Non-string tool-result content is re-encoded as canonical JSON text so
/// downstream consumers can treat it uniformly
fn normalize_tool_result_content(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

/// Parse a block list, skipping invalid entries
///
/// A non-empty list in which no block survives fails the whole message.
fn parse_blocks(value: &Value, data: &Value) -> Result<Vec<ContentBlock>> {
    let Some(items) = value.as_array() else {
        return Err(parse_err("content is neither a string nor a list", data));
    };
    let blocks: Vec<ContentBlock> = items.iter().filter_map(parse_block).collect();
    if blocks.is_empty() && !items.is_empty() {
        return Err(parse_err("message contains only invalid content blocks", data));
    }
    Ok(blocks)
}

// ============================================================================
// Variant parsers
// ============================================================================

fn parse_user(obj: &Map<String, Value>, data: &Value) -> Result<Message> {
    let nested = obj.get("message").and_then(Value::as_object);

    let content = match enveloped(obj, nested, "content") {
        None => None,
        Some(Value::String(s)) => Some(UserContent::Text(s.clone())),
        Some(value) => Some(UserContent::Blocks(parse_blocks(value, data)?)),
    };

    let role = enveloped_string(obj, nested, "role").unwrap_or_else(|| "user".to_string());

    Ok(Message::User {
        message: UserMessageContent {
            role,
            content,
        },
        uuid: opt_string(obj, "uuid"),
        session_id: opt_session_id(obj),
        parent_tool_use_id: opt_string(obj, "parent_tool_use_id"),
        is_synthetic: opt_bool(obj, "is_synthetic"),
        is_replay: opt_bool(obj, "is_replay"),
        tool_use_result: obj.get("tool_use_result").cloned(),
    })
}

fn parse_assistant(obj: &Map<String, Value>, data: &Value) -> Result<Message> {
    let nested = obj.get("message").and_then(Value::as_object);

    let content = match enveloped(obj, nested, "content") {
        None => Vec::new(),
        // A bare string degrades to a single text block
        Some(Value::String(s)) => vec![ContentBlock::Text { text: s.clone() }],
        Some(value) => parse_blocks(value, data)?,
    };

    let model = enveloped_string(obj, nested, "model")
        .ok_or_else(|| parse_err("assistant message has no 'model'", data))?;

    Ok(Message::Assistant {
        message: AssistantMessageContent {
            model,
            content,
            stop_reason: enveloped_string(obj, nested, "stop_reason"),
            error: enveloped_string(obj, nested, "error"),
        },
        uuid: opt_string(obj, "uuid"),
        session_id: opt_session_id(obj),
        parent_tool_use_id: opt_string(obj, "parent_tool_use_id"),
    })
}

fn parse_system(obj: &Map<String, Value>, data: &Value) -> Result<Message> {
    let Some(subtype) = obj.get("subtype").and_then(Value::as_str) else {
        return Err(parse_err("system message has no 'subtype'", data));
    };

    let system = match subtype {
        "init" => SystemMessage::Init {
            session_id: opt_session_id(obj),
            version: opt_string(obj, "version")
                .or_else(|| nested_data_string(obj, "version")),
            data: data.clone(),
        },
        "status" => SystemMessage::Status {
            status: opt_string(obj, "status"),
            session_id: opt_session_id(obj),
            data: data.clone(),
        },
        "compact_boundary" => SystemMessage::CompactBoundary {
            reason: opt_string(obj, "reason").or_else(|| nested_data_string(obj, "reason")),
            pre_compaction_tokens: obj
                .get("pre_compaction_tokens")
                .and_then(Value::as_u64),
            session_id: opt_session_id(obj),
            data: data.clone(),
        },
        "task_notification" => SystemMessage::TaskNotification {
            task_id: opt_string(obj, "task_id"),
            status: opt_string(obj, "status"),
            summary: opt_string(obj, "summary"),
            data: data.clone(),
        },
        "files_persisted" => SystemMessage::FilesPersisted {
            files: obj
                .get("files")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            data: data.clone(),
        },
        "hook_started" => SystemMessage::HookStarted {
            hook_event: opt_string(obj, "hook_event"),
            hook_id: opt_string(obj, "hook_id"),
            data: data.clone(),
        },
        "hook_progress" => SystemMessage::HookProgress {
            hook_id: opt_string(obj, "hook_id"),
            data: data.clone(),
        },
        "hook_response" => SystemMessage::HookResponse {
            hook_id: opt_string(obj, "hook_id"),
            data: data.clone(),
        },
        other => SystemMessage::Other {
            subtype: other.to_string(),
            data: data.clone(),
        },
    };

    Ok(Message::System(system))
}

/// Fields of typed system subtypes sometimes arrive inside `data`
fn nested_data_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get("data")
        .and_then(Value::as_object)
        .and_then(|data| opt_string(data, key))
}

fn parse_result(obj: &Map<String, Value>, data: &Value) -> Result<Message> {
    let Some(subtype) = obj.get("subtype").and_then(Value::as_str) else {
        return Err(parse_err("result message has no 'subtype'", data));
    };

    let model_usage: Option<HashMap<String, Value>> = obj
        .get("modelUsage")
        .and_then(Value::as_object)
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect());

    Ok(Message::Result {
        subtype: subtype.to_string(),
        duration_ms: obj.get("duration_ms").and_then(Value::as_u64).unwrap_or(0),
        duration_api_ms: obj
            .get("duration_api_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        is_error: opt_bool(obj, "is_error").unwrap_or(false),
        num_turns: obj
            .get("num_turns")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        session_id: opt_session_id(obj),
        total_cost_usd: obj.get("total_cost_usd").and_then(Value::as_f64),
        usage: obj.get("usage").cloned(),
        model_usage,
        permission_denials: obj.get("permission_denials").cloned(),
        errors: obj.get("errors").cloned(),
        stop_reason: opt_string(obj, "stop_reason"),
        result: opt_string(obj, "result"),
        structured_output: obj.get("structured_output").cloned(),
    })
}

fn parse_stream_event(obj: &Map<String, Value>, data: &Value) -> Result<Message> {
    // The event body normally sits under `event`, but flattened envelopes
    // carry its fields at the top level.
    let event_obj = obj.get("event").and_then(Value::as_object).unwrap_or(obj);

    let Some(event_type) = event_obj
        .get("event_type")
        .or_else(|| event_obj.get("type"))
        .and_then(Value::as_str)
        .filter(|t| *t != "stream_event")
    else {
        return Err(parse_err("stream event has no event type", data));
    };

    Ok(Message::StreamEvent {
        uuid: opt_string(obj, "uuid"),
        session_id: opt_session_id(obj),
        parent_tool_use_id: opt_string(obj, "parent_tool_use_id"),
        event: StreamEventBody {
            event_type: event_type.to_string(),
            index: event_obj.get("index").and_then(Value::as_u64),
            delta: event_obj.get("delta").cloned(),
            raw: Value::Object(event_obj.clone()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_blocks_are_reencoded_as_json_text() {
        let msg = parse_message(json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": "toolu_1",
                    "content": [{"type": "text", "text": "ok"}]
                }]
            }
        }))
        .unwrap();

        let Message::User { message, .. } = msg else {
            panic!("expected user message");
        };
        let Some(UserContent::Blocks(blocks)) = message.content else {
            panic!("expected block content");
        };
        let ContentBlock::ToolResult { content, .. } = &blocks[0] else {
            panic!("expected tool_result block");
        };
        assert_eq!(
            content.as_deref(),
            Some(r#"[{"type":"text","text":"ok"}]"#)
        );
    }

    #[test]
    fn flattened_stream_event_is_accepted() {
        let msg = parse_message(json!({
            "type": "stream_event",
            "event_type": "content_block_delta",
            "index": 0,
            "delta": {"text": "hi"}
        }))
        .unwrap();
        let Message::StreamEvent { event, .. } = msg else {
            panic!("expected stream event");
        };
        assert_eq!(event.event_type, "content_block_delta");
        assert_eq!(event.index, Some(0));
    }
}

//! Framing tests: split reassembly, overflow recovery, malformed isolation

use claude_code_client::ClaudeError;
use claude_code_client::transport::subprocess::{DEFAULT_MAX_BUFFER_SIZE, LineAccumulator};

#[test]
fn complete_line_decodes_immediately() {
    let mut acc = LineAccumulator::new(DEFAULT_MAX_BUFFER_SIZE);
    let value = acc
        .push_line(r#"{"type":"system","subtype":"init"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(value["subtype"], "init");
}

#[test]
fn blank_lines_are_ignored() {
    let mut acc = LineAccumulator::new(DEFAULT_MAX_BUFFER_SIZE);
    assert!(acc.push_line("").is_none());
    assert!(acc.push_line("   ").is_none());
    assert_eq!(acc.buffered(), 0);
}

#[test]
fn object_split_across_arbitrary_boundaries_reassembles_exactly_once() {
    let full = r#"{"type":"assistant","message":{"model":"m","content":[{"type":"text","text":"a long body with \"quotes\" inside"}]}}"#;

    // Split at every position, including inside string literals.
    for split_at in 1..full.len() - 1 {
        let (a, b) = full.split_at(split_at);
        let mut acc = LineAccumulator::new(DEFAULT_MAX_BUFFER_SIZE);
        let first = acc.push_line(a);
        let second = acc.push_line(b);

        let mut decoded = 0;
        for item in [first, second].into_iter().flatten() {
            let value = item.unwrap_or_else(|e| panic!("split at {split_at}: {e}"));
            assert_eq!(value["type"], "assistant");
            decoded += 1;
        }
        assert_eq!(decoded, 1, "split at {split_at} decoded {decoded} objects");
    }
}

#[test]
fn overflow_is_reported_and_later_objects_still_parse() {
    let mut acc = LineAccumulator::new(64);

    // An unterminated object that keeps growing past the limit.
    let err = loop {
        if let Some(result) = acc.push_line(&format!("{{\"filler\":\"{}", "x".repeat(40))) {
            break result.unwrap_err();
        }
    };
    assert!(matches!(err, ClaudeError::BufferOverflow { limit: 64 }));
    assert_eq!(acc.buffered(), 0);

    let value = acc.push_line(r#"{"ok":true}"#).unwrap().unwrap();
    assert_eq!(value["ok"], true);
}

#[test]
fn malformed_complete_object_reports_the_offending_line() {
    let mut acc = LineAccumulator::new(DEFAULT_MAX_BUFFER_SIZE);
    let err = acc.push_line(r#"{"type":"user",}"#).unwrap().unwrap_err();
    let ClaudeError::JsonDecode { line, .. } = err else {
        panic!("expected JsonDecode, got {err:?}");
    };
    assert_eq!(line, r#"{"type":"user",}"#);

    // The stream is not poisoned.
    let value = acc.push_line(r#"{"type":"user"}"#).unwrap().unwrap();
    assert_eq!(value["type"], "user");
}

#[test]
fn one_parse_attempt_per_line_makes_progress_on_pathological_input() {
    let mut acc = LineAccumulator::new(DEFAULT_MAX_BUFFER_SIZE);
    // Deeply incomplete JSON: every line is one more prefix, no completion.
    for _ in 0..1000 {
        assert!(acc.push_line(r#"{"a":"#).is_none() || acc.buffered() == 0);
    }
}

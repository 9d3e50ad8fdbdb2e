//! Framing: newline-delimited JSON with speculative accumulation
//!
//! The CLI writes one JSON object per line, but large objects may arrive
//! split across several lines (including inside string literals). The
//! accumulator appends each line and attempts exactly one decode per line;
//! an incomplete object keeps accumulating, a malformed complete object is
//! reported and dropped, and the accumulator is bounded so a runaway frame
//! cannot exhaust memory. A single bad frame never poisons the stream.

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::error::{ClaudeError, Result};

/// Accumulates stdout lines into complete JSON objects
#[derive(Debug)]
pub struct LineAccumulator {
    buffer: String,
    limit: usize,
}

impl LineAccumulator {
    /// Create an accumulator with the given byte limit
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            limit,
        }
    }

    /// Feed one line; returns a decoded object, an error, or nothing when
    /// the accumulated text is still an object prefix
    pub fn push_line(&mut self, line: &str) -> Option<Result<serde_json::Value>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.buffer.push_str(line);

        match serde_json::from_str::<serde_json::Value>(&self.buffer) {
            Ok(value) => {
                self.buffer.clear();
                Some(Ok(value))
            }
            Err(e) if e.is_eof() => {
                // Object split across lines; wait for the rest, unless the
                // accumulator already blew its budget.
                if self.buffer.len() > self.limit {
                    self.buffer.clear();
                    Some(Err(ClaudeError::BufferOverflow { limit: self.limit }))
                } else {
                    None
                }
            }
            Err(e) => {
                let offending = std::mem::take(&mut self.buffer);
                Some(Err(ClaudeError::json_decode(e.to_string(), offending)))
            }
        }
    }

    /// Bytes currently buffered
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Spawn the stdout reader task
///
/// Reads lines until EOF, feeding the accumulator and forwarding decoded
/// objects (and framing errors) to `tx`. On EOF the task reaps the child if
/// close has not already taken it, records the exit status, and reports a
/// non-zero exit as a process error before the channel closes.
pub(super) fn spawn_stdout_reader(
    stdout: ChildStdout,
    tx: mpsc::UnboundedSender<Result<serde_json::Value>>,
    max_buffer_size: usize,
    child: Arc<Mutex<Option<Child>>>,
    exit_status: Arc<parking_lot::Mutex<Option<ExitStatus>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut accumulator = LineAccumulator::new(max_buffer_size);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if let Some(result) = accumulator.push_line(&line)
                        && tx.send(result).is_err()
                    {
                        // Receiver dropped; stop reading.
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(ClaudeError::Io(e)));
                    break;
                }
            }
        }

        // Stdout is closed; reap unless close() already owns the child.
        let taken = child.lock().await.take();
        if let Some(mut child) = taken {
            match child.wait().await {
                Ok(status) => {
                    *exit_status.lock() = Some(status);
                    if !status.success() {
                        let code = status.code().unwrap_or(-1);
                        let _ = tx.send(Err(ClaudeError::process(
                            "CLI exited with a failure status",
                            code,
                            None,
                        )));
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(ClaudeError::Io(e)));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_split_inside_a_string_reassembles_once() {
        let mut acc = LineAccumulator::new(1024);
        assert!(acc.push_line(r#"{"type":"system","text":"hel"#).is_none());
        let value = acc
            .push_line(r#"lo"}"#)
            .expect("complete on second line")
            .expect("valid JSON");
        assert_eq!(value["text"], "hello");
        assert_eq!(acc.buffered(), 0);
    }

    #[test]
    fn malformed_complete_line_does_not_poison_the_stream() {
        let mut acc = LineAccumulator::new(1024);
        let err = acc.push_line(r#"{"type":}"#).unwrap().unwrap_err();
        assert!(matches!(err, ClaudeError::JsonDecode { .. }));
        let ok = acc.push_line(r#"{"type":"user"}"#).unwrap().unwrap();
        assert_eq!(ok["type"], "user");
    }

    #[test]
    fn overflow_resets_and_later_frames_parse() {
        let mut acc = LineAccumulator::new(32);
        assert!(acc.push_line(&format!("{{\"k\":\"{}", "a".repeat(64))).is_some());
        assert_eq!(acc.buffered(), 0);
        let ok = acc.push_line(r#"{"k":1}"#).unwrap().unwrap();
        assert_eq!(ok["k"], 1);
    }
}

//! One-shot query driver
//!
//! Non-streaming convenience: the prompt rides on argv, stdin closes right
//! after spawn, and no control engine runs, so control operations (hooks,
//! permission callbacks, in-process tools) are unavailable. The child is
//! drained until its first `result` message and then reaped.

use std::path::PathBuf;

use crate::error::{ClaudeError, Result};
use crate::message::parse_message;
use crate::transport::{PromptInput, SubprocessTransport, Transport};
use crate::types::messages::Message;
use crate::types::options::ClaudeAgentOptions;

/// Run one prompt to completion and return the collected messages
///
/// The returned sequence preserves emission order and ends with the turn's
/// `result` message.
///
/// # Arguments
/// * `prompt` - The prompt text
/// * `options` - Configuration options; defaults apply when `None`
/// * `cli_path` - Explicit CLI path; searched for when `None`
///
/// # Errors
/// Returns locate, version, launch, and validation errors before spawn;
/// framing and parse errors while draining; and a connection error when the
/// stream ends without a result.
///
/// # Example
///
/// ```no_run
/// use claude_code_client::query;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let messages = query("What is 2 + 2?", None, None).await?;
/// for message in &messages {
///     log::info!("{message:?}");
/// }
/// assert!(messages.last().is_some_and(|m| m.is_success()));
/// # Ok(())
/// # }
/// ```
pub async fn query(
    prompt: impl Into<String>,
    options: Option<ClaudeAgentOptions>,
    cli_path: Option<PathBuf>,
) -> Result<Vec<Message>> {
    let options = options.unwrap_or_default();
    options.validate()?;

    let mut transport =
        SubprocessTransport::new(PromptInput::String(prompt.into()), options, cli_path)?;
    transport.connect().await?;
    let mut raw_rx = transport.read_messages();

    let mut messages = Vec::new();
    let outcome = loop {
        match raw_rx.recv().await {
            None => {
                break Err(ClaudeError::connection(
                    "message stream closed before a result message",
                ));
            }
            Some(Err(e)) => break Err(e),
            Some(Ok(value)) => match parse_message(value) {
                Ok(message) => {
                    let is_result = matches!(message, Message::Result { .. });
                    messages.push(message);
                    if is_result {
                        break Ok(());
                    }
                }
                Err(e) => break Err(e),
            },
        }
    };

    let close_result = transport.close().await;
    outcome?;
    close_result?;
    Ok(messages)
}

//! Transport layer for communicating with the Claude Code CLI
//!
//! The transport owns the child process and its pipes. Everything above it
//! (control engine, client facade) sees newline-delimited JSON values going
//! out through [`Transport::write`] and coming in through the receiver
//! returned by [`Transport::read_messages`].

pub mod subprocess;

use tokio::sync::mpsc;

use crate::error::Result;

/// Transport trait for communicating with the CLI
///
/// `write` takes `&self`: the implementation serializes concurrent writers
/// internally on a single write mutex, acquired before any state read that
/// gates the write.
pub trait Transport: Send + Sync + 'static {
    /// Spawn the child and set up pipes
    ///
    /// # Errors
    /// Returns error if the executable is missing, too old, or fails to spawn
    fn connect(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Write one newline-terminated JSON line to the child's stdin
    ///
    /// # Errors
    /// Returns error if the transport is closed or the pipe write fails
    fn write(&self, data: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Close stdin to signal end of input
    ///
    /// # Errors
    /// Returns error if closing the pipe fails
    fn end_input(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Take the inbound message receiver
    ///
    /// Yields decoded JSON values (or framing errors) in the order the child
    /// emitted them; closes when the child's stdout reaches EOF. May be
    /// called once per connection.
    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>>;

    /// Whether the transport accepts writes
    fn is_ready(&self) -> bool;

    /// Close the transport: end input, reap the child, release resources
    ///
    /// Idempotent.
    ///
    /// # Errors
    /// Returns error if reaping fails
    fn close(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub use subprocess::{PromptInput, SubprocessTransport};

//! Request/response correlation engine
//!
//! One [`ControlProtocol`] lives per streaming connection. It owns the
//! pending-request table and the request ID counter; the client's router
//! task feeds it every inbound control envelope. Outbound requests are
//! written through the transport's single write mutex, so control traffic,
//! handler replies, and user turns interleave only at message granularity.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;

use crate::Transport;
use crate::error::{ClaudeError, Result};
use crate::types::identifiers::RequestId;

use super::messages::{InboundControlResponse, OutboundRequest, request_envelope, response_envelope};
use super::DEFAULT_CONTROL_REQUEST_TIMEOUT;

/// Terminal state of a pending request slot
#[derive(Debug)]
enum Outcome {
    Success(serde_json::Value),
    Error(String),
    Cancelled,
}

/// Request ID source shared by every engine in the process, so IDs stay
/// unique and monotonic across reconnects
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// Control protocol engine
///
/// Only meaningful in streaming mode; one-shot runs never construct one.
pub struct ControlProtocol<T: Transport> {
    transport: Arc<T>,
    pending: Mutex<HashMap<String, oneshot::Sender<Outcome>>>,
    cancel: CancellationToken,
}

impl<T: Transport> ControlProtocol<T> {
    /// Create an engine writing through `transport`
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            pending: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelled when the engine shuts down
    ///
    /// Handlers receive child tokens of this one as their advisory signal.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Generate the next request ID (`req_1`, `req_2`, ...)
    fn next_id(&self) -> RequestId {
        let n = NEXT_REQUEST_ID.fetch_add(1, Ordering::SeqCst) + 1;
        RequestId::new(format!("req_{n}"))
    }

    /// Number of requests still awaiting an outcome
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Send a control request with the default deadline
    ///
    /// # Errors
    /// See [`Self::send_request_with_timeout`]
    pub async fn send_request(&self, request: OutboundRequest) -> Result<serde_json::Value> {
        self.send_request_with_timeout(request, DEFAULT_CONTROL_REQUEST_TIMEOUT)
            .await
    }

    /// Send a control request and await its single outcome
    ///
    /// The slot is removed from the pending table on every outcome.
    ///
    /// # Errors
    /// - `ClaudeError::Cancelled` when the engine shut down or the CLI sent
    ///   a `control_cancel_request` for this ID
    /// - `ClaudeError::Timeout` when the deadline passes
    /// - `ClaudeError::ControlProtocol` when the CLI answers with an error
    /// - transport errors from the write
    pub async fn send_request_with_timeout(
        &self,
        request: OutboundRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        if self.cancel.is_cancelled() {
            return Err(ClaudeError::cancelled("control engine is shut down"));
        }

        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(id.as_str().to_string(), tx);

        let line = match request_envelope(&id, &request) {
            Ok(line) => line,
            Err(e) => {
                self.pending.lock().await.remove(id.as_str());
                return Err(e);
            }
        };
        if let Err(e) = self.transport.write(&line).await {
            self.pending.lock().await.remove(id.as_str());
            return Err(e);
        }

        let outcome = tokio::select! {
            received = rx => received.unwrap_or(Outcome::Cancelled),
            () = tokio::time::sleep(timeout) => {
                self.pending.lock().await.remove(id.as_str());
                return Err(ClaudeError::timeout(format!(
                    "control request {id} received no response within {timeout:?}"
                )));
            }
            () = self.cancel.cancelled() => {
                self.pending.lock().await.remove(id.as_str());
                return Err(ClaudeError::cancelled(format!(
                    "control request {id} aborted by shutdown"
                )));
            }
        };

        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Error(message) => Err(ClaudeError::control_protocol(message)),
            Outcome::Cancelled => Err(ClaudeError::cancelled(format!(
                "control request {id} was cancelled"
            ))),
        }
    }

    /// Resolve a pending slot from an inbound `control_response` envelope
    ///
    /// A response for an unknown ID is dropped: the request may already have
    /// timed out or been cancelled.
    pub async fn handle_response(&self, envelope: &serde_json::Value) -> Result<()> {
        let response = InboundControlResponse::from_envelope(envelope)?;
        let slot = self.pending.lock().await.remove(&response.request_id);
        let Some(slot) = slot else {
            log::debug!(
                "dropping control_response for unknown request {}",
                response.request_id
            );
            return Ok(());
        };

        let outcome = if response.subtype == "error" {
            Outcome::Error(
                response
                    .error
                    .unwrap_or_else(|| "unspecified control error".to_string()),
            )
        } else {
            Outcome::Success(response.response.unwrap_or(serde_json::Value::Null))
        };
        let _ = slot.send(outcome);
        Ok(())
    }

    /// Mark one pending slot cancelled (peer `control_cancel_request`)
    pub async fn handle_cancel(&self, request_id: &str) {
        if let Some(slot) = self.pending.lock().await.remove(request_id) {
            let _ = slot.send(Outcome::Cancelled);
        } else {
            log::debug!("control_cancel_request for unknown request {request_id}");
        }
    }

    /// Write a reply to an inbound control request
    ///
    /// # Errors
    /// Returns transport errors from the write
    pub async fn send_response(
        &self,
        request_id: &str,
        result: &Result<serde_json::Value>,
    ) -> Result<()> {
        if let Err(e) = result {
            log::debug!("answering control request {request_id} with error: {e}");
        }
        let line = response_envelope(request_id, result);
        self.transport.write(&line).await
    }

    /// Cancel every outstanding waiter and reject new requests
    ///
    /// Idempotent; called when the connection closes or the child dies.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut pending = self.pending.lock().await;
        for (_, slot) in pending.drain() {
            let _ = slot.send(Outcome::Cancelled);
        }
    }
}

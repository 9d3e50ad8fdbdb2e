//! Control protocol for bidirectional communication with the CLI
//!
//! Control traffic shares the child's stdio pipes with conversational
//! messages. Outbound requests are correlated to their responses by
//! generated `req_N` IDs; inbound requests (permission checks, hook
//! callbacks, in-process tool calls) are dispatched to handlers and
//! answered with `control_response` envelopes.

mod engine;
mod messages;

use std::time::Duration;

pub use engine::ControlProtocol;
pub use messages::{
    InboundControlRequest, InboundControlResponse, OutboundRequest, RewindFilesOptions,
    request_envelope, response_envelope,
};

/// Deadline for ordinary control requests
pub const DEFAULT_CONTROL_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for the initialize round-trip; the CLI may still be loading
/// settings and connecting MCP servers
pub const INIT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

//! Crate-wide error type.
//!
//! Mirrors spec.md §7: transport-level failures and cancellation propagate to
//! the caller as `AgentError`; everything the model can recover from (tool
//! errors, malformed chunks, hook failures) is represented as data elsewhere
//! and never constructed here.

use thiserror::Error;

/// Error returned by the public agent surface (`Agent::reply`, `Agent::stream`).
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model adapter's stream terminated abnormally (spec.md §7, "Model transport error").
    #[error("model transport error: {0}")]
    Transport(String),

    /// The caller (or an ancestor scope) cancelled the in-flight call.
    #[error("call cancelled")]
    Cancelled,

    /// A tool name passed to `register_tool` was not a valid JSON-Schema object shape.
    #[error("invalid tool schema for {name}: {reason}")]
    InvalidToolSchema { name: String, reason: String },
}

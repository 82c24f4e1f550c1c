//! Error handling for the client library.
//!
//! Two kinds of failure exist and are deliberately kept apart:
//!
//! - [`Error`] — failures that surface to the caller (authentication,
//!   transport, malformed structured output, an unknown tool name, the tool
//!   loop guard). These propagate uncaught.
//! - [`ToolFault`] — a failure raised *inside* a registered tool. Faults are
//!   contained by the dispatcher, converted into an error-shaped result
//!   mapping, and fed back to the model as data so the conversation can
//!   continue.

use thiserror::Error;

/// Errors surfaced to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// No credential could be resolved at client construction.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network or connection failure before a response was obtained.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A structured-output payload did not conform to the declared schema.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// The model requested a tool name that is not in the registry.
    ///
    /// Lookup is by exact name; no fuzzy or alias matching is attempted.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The automatic tool-dispatch loop hit its configured bound.
    #[error("Tool dispatch loop exceeded {rounds} round-trips")]
    ToolLoopExceeded { rounds: usize },

    /// Request validation failure (e.g. combining a response schema with
    /// automatically executed tools).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote tool-protocol session failure (handshake, framing, transport).
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Malformed JSON on a wire payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The chunk stream ended abnormally or delivered an undecodable event.
    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure raised by a registered tool during execution.
///
/// Never propagated to the caller of `send`: the dispatcher wraps it as
/// `{"error": ...}` in the function-response part.
#[derive(Debug, Clone)]
pub struct ToolFault {
    message: String,
}

impl ToolFault {
    /// Create a fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The fault message as reported back to the model.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ToolFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ToolFault {}

impl From<Error> for ToolFault {
    fn from(err: Error) -> Self {
        Self::new(err.to_string())
    }
}

//! Error types for the outbound queue subsystem.

use thiserror::Error;

/// Errors raised while delivering queued items.
#[derive(Debug, Error)]
pub enum OutboundError {
    /// Subscriber delivery has not been activated yet.
    #[error("Order tracker is not activated")]
    NotActivated,

    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Consensus node could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// JSON-RPC level error returned by the consensus node.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// Response did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Endpoint configuration is unusable.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl OutboundError {
    /// Whether retrying the same item later could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, OutboundError::InvalidEndpoint(_))
    }
}

/// Result alias for outbound operations.
pub type OutboundResult<T> = Result<T, OutboundError>;

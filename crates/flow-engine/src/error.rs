//! Error types for the flow engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the flow engine
///
/// Graph edits never fail and producer failures are absorbed per node, so
/// these only cover misuse of the engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A run was requested while another is in flight
    #[error("A workflow run is already in progress")]
    AlreadyRunning,
}

/// Error returned by a content producer
#[derive(Debug, Clone, Error)]
pub enum ProducerError {
    /// The backing service could not be reached
    #[error("Producer unavailable: {0}")]
    Unavailable(String),

    /// The service answered with an error
    #[error("Producer rejected request: {0}")]
    Rejected(String),

    /// The response could not be interpreted
    #[error("Invalid producer response: {0}")]
    InvalidResponse(String),
}

impl ProducerError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

//! Error types for the relay core.

use thiserror::Error;

/// Failures at the completion service boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The provider rejected or failed the request.
    #[error("provider error: {0}")]
    Provider(String),
    /// The fragment stream ended abnormally.
    #[error("stream interrupted: {0}")]
    Interrupted(String),
    /// The provider could not be constructed.
    #[error("provider setup failed: {0}")]
    Setup(String),
}

/// Failures when sending through the chat transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The platform refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The platform could not be reached.
    #[error("network error: {0}")]
    Network(String),
}

/// Reasons a conversation turn could not produce a reply.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

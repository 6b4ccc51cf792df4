//! Error types for the reconciliation engine.

use feedsync_core::CoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by engine operations.
///
/// `Network`, `Api` and `Unknown` classify the outcome of a remote call.
/// The presentation layer treats all of them alike.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The remote call could not complete.
    #[error("network error")]
    Network,

    /// The remote call completed with a non-success status or no usable payload.
    #[error("api error {status}: {message}")]
    Api {
        /// HTTP-style status code.
        status: u16,
        /// Status message.
        message: String,
    },

    /// Any other failure (decoding, local store write, ...).
    #[error("unknown error: {0}")]
    Unknown(String),

    /// A post with blank content was submitted. No remote call was made.
    #[error("post content is empty")]
    EmptyContent,
}

impl FeedError {
    /// Creates an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Returns true for transport-level failures.
    pub fn is_network(&self) -> bool {
        matches!(self, FeedError::Network)
    }
}

impl From<CoreError> for FeedError {
    fn from(err: CoreError) -> Self {
        FeedError::Unknown(err.to_string())
    }
}

impl From<RemoteError> for FeedError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Transport(_) => FeedError::Network,
            RemoteError::Decode(message) | RemoteError::Other(message) => {
                FeedError::Unknown(message)
            }
        }
    }
}

/// Result type for remote client calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures of a remote call that produced no response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connectivity loss, timeout, refused connection.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Anything else.
    #[error("remote error: {0}")]
    Other(String),
}

//! Error types for the post store.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the post store.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] feedsync_storage::StorageError),

    /// I/O error outside the backend (directory, lock file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A post could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The post log is corrupted before its tail.
    #[error("post log corruption at offset {offset}: {message}")]
    LogCorruption {
        /// Offset of the bad record.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Another process holds the cache directory.
    #[error("post store is locked by another process")]
    StoreLocked,

    /// The cache directory is missing or not a directory.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a log corruption error.
    pub fn log_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::LogCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::log_corruption(42, "crc mismatch");
        assert_eq!(
            err.to_string(),
            "post log corruption at offset 42: crc mismatch"
        );
        assert_eq!(
            CoreError::StoreLocked.to_string(),
            "post store is locked by another process"
        );
    }
}

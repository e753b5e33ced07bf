//! Error types for search sync.

use search_sync_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while buffering or flushing changes.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Collection configuration is malformed (e.g. no primary field).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A domain object could not be converted into a search document.
    #[error("Conversion error: {0}")]
    ConversionError(String),

    /// A backend call failed.
    #[error("Backend error: {0}")]
    BackendError(#[from] SearchIndexError),

    /// One or more backend calls failed during a flush.
    #[error("Flush failed: {failed} of {attempted} operations failed, first error: {first}")]
    FlushError {
        failed: usize,
        attempted: usize,
        first: SearchIndexError,
    },
}

impl SyncError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a conversion error.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::ConversionError(msg.into())
    }
}

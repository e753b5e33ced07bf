//! Configuration types for the DocumentService.

/// Default maximum number of documents sent in a single import call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Configuration for the DocumentService.
///
/// Controls how large a single import call to the backend may get. Imports
/// larger than the limit are split into several calls rather than rejected.
#[derive(Debug, Clone)]
pub struct DocumentServiceConfig {
    /// Maximum number of documents sent in a single import call.
    ///
    /// Set to `None` to send every import in one call regardless of size.
    /// Defaults to 1000 if not specified.
    pub max_batch_size: Option<usize>,
}

impl Default for DocumentServiceConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

impl DocumentServiceConfig {
    /// Create a config with no batch size limit.
    ///
    /// # Warning
    ///
    /// Very large unit-of-work commits then produce equally large bulk requests,
    /// which may hit backend request size limits.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    ///
    /// A limit of zero is treated as one document per call.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size.max(1)),
        }
    }
}

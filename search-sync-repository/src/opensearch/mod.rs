//! OpenSearch implementation of the search backend.
//!
//! This module provides a concrete implementation of `SearchBackend`
//! using OpenSearch's bulk and document APIs.

mod backend;
mod index_config;

pub use backend::OpenSearchBackend;
pub use index_config::IndexConfig;

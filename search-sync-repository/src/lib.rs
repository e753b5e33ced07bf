//! # Search Sync Repository
//!
//! This crate provides the backend side of search synchronization: the
//! `SearchBackend` trait the coordinator flushes through, a validating and
//! chunking `DocumentService` decorator, and a concrete implementation for
//! OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod types;

pub use config::DocumentServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchBackend;
pub use opensearch::OpenSearchBackend;
pub use service::DocumentService;
pub use types::{ImportAction, ImportResult, ImportSummary};

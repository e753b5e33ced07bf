//! Search backend trait definition.
//!
//! This module defines the abstract interface for the bulk write operations the
//! coordinator flushes through, allowing for different backend implementations
//! (OpenSearch, test doubles, decorators).

use async_trait::async_trait;

use search_sync_shared::ChangeRecord;

use crate::errors::SearchIndexError;
use crate::types::{ImportAction, ImportSummary};

/// Abstracts the underlying search backend implementation.
///
/// Implementations are injected into the coordinator (usually wrapped in a
/// `DocumentService`) to enable dependency injection and easy testing with mock
/// implementations.
///
/// All methods return `Result<T, SearchIndexError>` for consistent error handling
/// across different backend implementations.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Import documents into a collection.
    ///
    /// With [`ImportAction::Create`] each document is inserted; with
    /// [`ImportAction::Upsert`] existing documents with the same id are replaced.
    /// Documents are written in the order given, so when the same id appears twice
    /// the later record wins.
    ///
    /// # Arguments
    ///
    /// * `collection` - Target collection name in the backend
    /// * `records` - Documents to write, each carrying an `id` field
    /// * `action` - Insert or upsert semantics
    ///
    /// # Returns
    ///
    /// * `Ok(ImportSummary)` - Per-document outcome of the import
    /// * `Err(SearchIndexError)` - If the import failed as a whole
    async fn import(
        &self,
        collection: &str,
        records: &[ChangeRecord],
        action: ImportAction,
    ) -> Result<ImportSummary, SearchIndexError>;

    /// Delete a document from a collection.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), SearchIndexError>;
}

//! Document service implementation.
//!
//! This module provides the validating front for a search backend. The
//! coordinator flushes through it: it checks every request before it reaches the
//! backend and splits large imports into bounded bulk calls.

use async_trait::async_trait;
use tracing::debug;

use search_sync_shared::ChangeRecord;

use crate::config::DocumentServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchBackend;
use crate::types::{ImportAction, ImportSummary};

/// Validating, chunking decorator around a `SearchBackend`.
///
/// This is the backend application code hands to the coordinator. It provides
/// input validation and batch splitting, and delegates to the wrapped backend for
/// the actual writes. `DocumentService` implements `SearchBackend` itself, so it
/// can be injected anywhere a backend is expected.
///
/// # Example
///
/// ```no_run
/// use search_sync_repository::{DocumentService, ImportAction, SearchBackend};
/// use search_sync_repository::opensearch::{IndexConfig, OpenSearchBackend};
/// use search_sync_shared::ChangeRecord;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = OpenSearchBackend::new("http://localhost:9200", IndexConfig::default())?;
/// let service = DocumentService::new(Box::new(backend));
///
/// let records = vec![ChangeRecord::with_id("42")];
/// service.import("articles", &records, ImportAction::Upsert).await?;
/// # Ok(())
/// # }
/// ```
pub struct DocumentService {
    backend: Box<dyn SearchBackend>,
    config: DocumentServiceConfig,
}

impl DocumentService {
    /// Create a new DocumentService with default configuration.
    ///
    /// The default configuration splits imports into calls of at most 1000 documents.
    pub fn new(backend: Box<dyn SearchBackend>) -> Self {
        Self {
            backend,
            config: DocumentServiceConfig::default(),
        }
    }

    /// Create a new DocumentService with custom configuration.
    pub fn with_config(backend: Box<dyn SearchBackend>, config: DocumentServiceConfig) -> Self {
        Self { backend, config }
    }

    fn validate_collection(collection: &str) -> Result<(), SearchIndexError> {
        if collection.trim().is_empty() {
            return Err(SearchIndexError::validation("collection name is required"));
        }
        Ok(())
    }

    fn validate_records(records: &[ChangeRecord]) -> Result<(), SearchIndexError> {
        for (position, record) in records.iter().enumerate() {
            match record.id() {
                Some(id) if !id.is_empty() => {}
                _ => {
                    return Err(SearchIndexError::validation(format!(
                        "record at position {} has no id",
                        position
                    )))
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for DocumentService {
    /// Import documents, splitting them into calls of at most `max_batch_size`.
    ///
    /// # Returns
    ///
    /// * `Ok(ImportSummary)` - Merged summary of every chunk
    /// * `Err(SearchIndexError::ValidationError)` - If the collection name is empty
    ///   or a record has no id; nothing is sent in that case
    /// * `Err(SearchIndexError)` - If a chunk fails as a whole; earlier chunks stay written
    async fn import(
        &self,
        collection: &str,
        records: &[ChangeRecord],
        action: ImportAction,
    ) -> Result<ImportSummary, SearchIndexError> {
        Self::validate_collection(collection)?;

        if records.is_empty() {
            return Ok(ImportSummary::default());
        }

        Self::validate_records(records)?;

        let chunk_size = self.config.max_batch_size.unwrap_or(records.len()).max(1);
        let mut summary = ImportSummary::default();

        for chunk in records.chunks(chunk_size) {
            debug!(
                collection = %collection,
                action = %action,
                count = chunk.len(),
                "Importing document chunk"
            );
            summary.merge(self.backend.import(collection, chunk, action).await?);
        }

        Ok(summary)
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), SearchIndexError> {
        Self::validate_collection(collection)?;

        if document_id.is_empty() {
            return Err(SearchIndexError::validation("document id is required"));
        }

        self.backend.delete(collection, document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImportResult;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Mock backend for testing
    #[derive(Clone)]
    struct MockBackend {
        import_calls: Arc<Mutex<Vec<(String, Vec<ChangeRecord>, ImportAction)>>>,
        delete_calls: Arc<Mutex<Vec<(String, String)>>>,
        should_fail: bool,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                import_calls: Arc::new(Mutex::new(Vec::new())),
                delete_calls: Arc::new(Mutex::new(Vec::new())),
                should_fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SearchBackend for MockBackend {
        async fn import(
            &self,
            collection: &str,
            records: &[ChangeRecord],
            action: ImportAction,
        ) -> Result<ImportSummary, SearchIndexError> {
            if self.should_fail {
                return Err(SearchIndexError::import("Mock failure"));
            }
            self.import_calls
                .lock()
                .await
                .push((collection.to_string(), records.to_vec(), action));
            Ok(ImportSummary::from_results(
                records
                    .iter()
                    .map(|r| ImportResult::succeeded(r.id().unwrap_or_default()))
                    .collect(),
            ))
        }

        async fn delete(
            &self,
            collection: &str,
            document_id: &str,
        ) -> Result<(), SearchIndexError> {
            if self.should_fail {
                return Err(SearchIndexError::delete("Mock failure"));
            }
            self.delete_calls
                .lock()
                .await
                .push((collection.to_string(), document_id.to_string()));
            Ok(())
        }
    }

    fn records(count: usize) -> Vec<ChangeRecord> {
        (0..count)
            .map(|i| ChangeRecord::with_id(i.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_import_empty_skips_backend() {
        let backend = MockBackend::new();
        let service = DocumentService::new(Box::new(backend.clone()));

        let summary = service
            .import("articles", &[], ImportAction::Create)
            .await
            .unwrap();

        assert_eq!(summary.total, 0);
        assert!(backend.import_calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_import_single_call_under_limit() {
        let backend = MockBackend::new();
        let service = DocumentService::new(Box::new(backend.clone()));

        let summary = service
            .import("articles", &records(3), ImportAction::Upsert)
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);
        let calls = backend.import_calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "articles");
        assert_eq!(calls[0].2, ImportAction::Upsert);
    }

    #[tokio::test]
    async fn test_import_splits_into_chunks() {
        let backend = MockBackend::new();
        let config = DocumentServiceConfig::with_max_batch_size(2);
        let service = DocumentService::with_config(Box::new(backend.clone()), config);

        let summary = service
            .import("articles", &records(5), ImportAction::Create)
            .await
            .unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 5);
        let sizes: Vec<usize> = backend
            .import_calls
            .lock()
            .await
            .iter()
            .map(|(_, records, _)| records.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_import_unlimited_sends_one_call() {
        let backend = MockBackend::new();
        let service =
            DocumentService::with_config(Box::new(backend.clone()), DocumentServiceConfig::unlimited());

        service
            .import("articles", &records(2500), ImportAction::Create)
            .await
            .unwrap();

        assert_eq!(backend.import_calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_import_validation() {
        let backend = MockBackend::new();
        let service = DocumentService::new(Box::new(backend.clone()));

        // Empty collection name
        let result = service.import("", &records(1), ImportAction::Create).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        // Record without an id
        let mut batch = records(1);
        batch.push(ChangeRecord::new());
        let result = service.import("articles", &batch, ImportAction::Create).await;
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));

        assert!(backend.import_calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_import_propagates_backend_failure() {
        let service = DocumentService::new(Box::new(MockBackend::failing()));

        let result = service
            .import("articles", &records(1), ImportAction::Create)
            .await;

        assert!(matches!(result, Err(SearchIndexError::ImportError(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = MockBackend::new();
        let service = DocumentService::new(Box::new(backend.clone()));

        service.delete("articles", "42").await.unwrap();

        let calls = backend.delete_calls.lock().await;
        assert_eq!(calls.as_slice(), &[("articles".to_string(), "42".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_validation() {
        let backend = MockBackend::new();
        let service = DocumentService::new(Box::new(backend.clone()));

        assert!(service.delete("", "42").await.is_err());
        assert!(service.delete("articles", "").await.is_err());
        assert!(backend.delete_calls.lock().await.is_empty());
    }
}

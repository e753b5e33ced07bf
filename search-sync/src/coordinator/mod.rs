//! Change batch coordinator.
//!
//! Receives the host's per-object lifecycle notifications during a unit of work,
//! buffers the resulting search documents by collection, and writes them to the
//! search backend in one flush once the unit of work has completed.
//!
//! ## Cycle
//!
//! 1. `on_created` / `on_updated` buffer converted records for import.
//! 2. `on_before_removed` captures the document id while the object is still
//!    populated; `on_removed` turns the capture into a delete.
//! 3. `on_cycle_complete` imports creates, then upserts updates, then deletes,
//!    and leaves every buffer empty whatever the outcome.

mod batch;

pub use batch::{CollectionBuffer, PendingBatch, PendingDelete};

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use search_sync_repository::{ImportAction, SearchBackend, SearchIndexError};
use search_sync_shared::{ChangeRecord, CollectionDefinition, IndexableObject, SourceType};

use crate::config::{CoordinatorConfig, FlushPolicy};
use crate::errors::SyncError;
use crate::registry::CollectionRegistry;
use crate::transformer::DocumentTransformer;

/// Lifecycle notification delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The object was inserted.
    Created,
    /// The object was updated.
    Updated,
    /// The object is about to be removed and is still fully populated.
    BeforeRemoved,
    /// The object was removed.
    Removed,
}

/// Outcome of a flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Documents inserted.
    pub indexed: usize,
    /// Documents upserted.
    pub updated: usize,
    /// Documents deleted.
    pub deleted: usize,
    /// Documents the backend rejected individually during an import.
    pub rejected: usize,
}

/// A single backend call of a flush.
enum FlushOperation {
    Import {
        collection: String,
        records: Vec<ChangeRecord>,
        action: ImportAction,
    },
    Delete(PendingDelete),
}

/// Buffers lifecycle changes of one unit of work and flushes them once.
///
/// The coordinator is owned by a single unit of work at a time: every callback
/// takes `&mut self`. Hosts running overlapping units of work use one coordinator
/// per unit of work.
///
/// # Example
///
/// ```ignore
/// let mut coordinator = ChangeBatchCoordinator::new(registry, transformer, backend);
///
/// coordinator.on_created(&article)?;
/// coordinator.on_before_removed(&old_article)?;
/// coordinator.on_removed(&old_article)?;
///
/// let report = coordinator.on_cycle_complete().await?;
/// ```
pub struct ChangeBatchCoordinator {
    registry: Arc<dyn CollectionRegistry>,
    transformer: Arc<dyn DocumentTransformer>,
    backend: Arc<dyn SearchBackend>,
    config: CoordinatorConfig,
    /// Collection key for every managed source type.
    managed_types: HashMap<SourceType, String>,
    batch: PendingBatch,
}

impl ChangeBatchCoordinator {
    /// Create a new coordinator with default configuration.
    pub fn new(
        registry: Arc<dyn CollectionRegistry>,
        transformer: Arc<dyn DocumentTransformer>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self::with_config(registry, transformer, backend, CoordinatorConfig::default())
    }

    /// Create a new coordinator with custom configuration.
    pub fn with_config(
        registry: Arc<dyn CollectionRegistry>,
        transformer: Arc<dyn DocumentTransformer>,
        backend: Arc<dyn SearchBackend>,
        config: CoordinatorConfig,
    ) -> Self {
        let managed_types = registry
            .managed_types()
            .into_iter()
            .map(|(key, source_type)| (source_type, key))
            .collect();

        Self {
            registry,
            transformer,
            backend,
            config,
            managed_types,
            batch: PendingBatch::default(),
        }
    }

    /// The changes buffered so far in the current cycle.
    pub fn pending(&self) -> &PendingBatch {
        &self.batch
    }

    /// Whether the object's type is mirrored into the search index.
    pub fn is_managed(&self, object: &dyn IndexableObject) -> bool {
        self.collection_key(object).is_some()
    }

    fn collection_key(&self, object: &dyn IndexableObject) -> Option<&str> {
        self.managed_types
            .get(&object.source_type())
            .map(String::as_str)
    }

    fn definition(&self, key: &str) -> Result<&CollectionDefinition, SyncError> {
        self.registry.definition(key).ok_or_else(|| {
            SyncError::configuration(format!("no definition for collection '{}'", key))
        })
    }

    /// Check that a definition has exactly one primary field.
    fn check_primary_field(definition: &CollectionDefinition) -> Result<(), SyncError> {
        match definition.primary_field_count() {
            1 => Ok(()),
            0 => Err(SyncError::configuration(format!(
                "primary key info has not been found for collection '{}'",
                definition.target_name
            ))),
            count => Err(SyncError::configuration(format!(
                "collection '{}' defines {} primary fields, expected exactly one",
                definition.target_name, count
            ))),
        }
    }

    /// Dispatch a lifecycle notification to the matching callback.
    pub fn handle(
        &mut self,
        event: LifecycleEvent,
        object: &dyn IndexableObject,
    ) -> Result<(), SyncError> {
        match event {
            LifecycleEvent::Created => self.on_created(object),
            LifecycleEvent::Updated => self.on_updated(object),
            LifecycleEvent::BeforeRemoved => self.on_before_removed(object),
            LifecycleEvent::Removed => self.on_removed(object),
        }
    }

    /// Buffer a newly created object for import.
    ///
    /// Objects of unmanaged types are ignored.
    pub fn on_created(&mut self, object: &dyn IndexableObject) -> Result<(), SyncError> {
        let Some(key) = self.collection_key(object) else {
            return Ok(());
        };
        let collection = self.definition(key)?.target_name.clone();
        let record = self.transformer.convert(object)?;

        debug!(collection = %collection, id = ?record.id(), "Buffered created document");
        self.batch.to_index.push(&collection, record);
        Ok(())
    }

    /// Buffer an updated object for upsert.
    ///
    /// Objects of unmanaged types are ignored.
    ///
    /// # Returns
    ///
    /// * `Err(SyncError::ConfigurationError)` - If the collection does not define exactly
    ///   one primary field; nothing is buffered
    pub fn on_updated(&mut self, object: &dyn IndexableObject) -> Result<(), SyncError> {
        let Some(key) = self.collection_key(object) else {
            return Ok(());
        };
        let definition = self.definition(key)?;
        Self::check_primary_field(definition)?;
        let collection = definition.target_name.clone();
        let record = self.transformer.convert(object)?;

        debug!(collection = %collection, id = ?record.id(), "Buffered updated document");
        self.batch.to_update.push(&collection, record);
        Ok(())
    }

    /// Capture the document id of an object about to be removed.
    ///
    /// Must run while the object is still fully populated. Objects of unmanaged
    /// types are ignored, which also means their removal is never propagated.
    pub fn on_before_removed(&mut self, object: &dyn IndexableObject) -> Result<(), SyncError> {
        if !self.is_managed(object) {
            return Ok(());
        }

        let record = self.transformer.convert(object)?;
        let document_id = record.id().ok_or_else(|| {
            SyncError::conversion(format!(
                "converted '{}' document has no id",
                object.source_type()
            ))
        })?;

        let identity = object.identity();
        if !self.batch.capture_delete_id(identity, document_id) {
            debug!(identity = %identity, "Document id already captured for removal");
        }
        Ok(())
    }

    /// Queue the delete of a removed object whose id was captured beforehand.
    pub fn on_removed(&mut self, object: &dyn IndexableObject) -> Result<(), SyncError> {
        let Some(document_id) = self.batch.take_delete_id(&object.identity()) else {
            return Ok(());
        };
        let Some(key) = self.collection_key(object) else {
            return Ok(());
        };
        let collection = self.definition(key)?.target_name.clone();

        debug!(collection = %collection, id = %document_id, "Buffered deleted document");
        self.batch.to_delete.push(PendingDelete {
            collection,
            document_id,
        });
        Ok(())
    }

    /// Flush everything buffered during the unit of work.
    ///
    /// Imports run first, then upserts, then deletes. The buffers are empty when
    /// this returns, whether or not the backend calls succeeded; nothing is kept
    /// for a retry.
    ///
    /// # Returns
    ///
    /// * `Ok(FlushReport)` - If every backend call succeeded (individual documents may
    ///   still have been rejected, see `FlushReport::rejected`)
    /// * `Err(SyncError::FlushError)` - With `FlushPolicy::ContinueOnError`, if any call failed
    /// * `Err(SyncError::BackendError)` - With `FlushPolicy::StopOnError`, the first failure
    #[instrument(skip(self))]
    pub async fn on_cycle_complete(&mut self) -> Result<FlushReport, SyncError> {
        let PendingBatch {
            to_index,
            to_update,
            to_delete,
            pending_delete_ids,
        } = std::mem::take(&mut self.batch);

        if !pending_delete_ids.is_empty() {
            warn!(
                count = pending_delete_ids.len(),
                "Discarding ids captured for objects that were never removed"
            );
        }

        let operations: Vec<FlushOperation> = to_index
            .into_iter()
            .map(|(collection, records)| FlushOperation::Import {
                collection,
                records,
                action: ImportAction::Create,
            })
            .chain(
                to_update
                    .into_iter()
                    .map(|(collection, records)| FlushOperation::Import {
                        collection,
                        records,
                        action: ImportAction::Upsert,
                    }),
            )
            .chain(to_delete.into_iter().map(FlushOperation::Delete))
            .collect();

        if operations.is_empty() {
            debug!("Nothing to flush");
            return Ok(FlushReport::default());
        }

        let attempted = operations.len();
        let mut report = FlushReport::default();
        let mut failures = Vec::new();

        for (position, operation) in operations.into_iter().enumerate() {
            if let Err(e) = self.execute(operation, &mut report).await {
                if self.config.flush_policy == FlushPolicy::StopOnError {
                    warn!(
                        skipped = attempted - position - 1,
                        "Stopping flush after failed operation"
                    );
                    return Err(SyncError::BackendError(e));
                }
                failures.push(e);
            }
        }

        let failed = failures.len();
        if let Some(first) = failures.into_iter().next() {
            return Err(SyncError::FlushError {
                failed,
                attempted,
                first,
            });
        }

        info!(
            indexed = report.indexed,
            updated = report.updated,
            deleted = report.deleted,
            rejected = report.rejected,
            "Flushed pending changes"
        );
        Ok(report)
    }

    async fn execute(
        &self,
        operation: FlushOperation,
        report: &mut FlushReport,
    ) -> Result<(), SearchIndexError> {
        match operation {
            FlushOperation::Import {
                collection,
                records,
                action,
            } => {
                let summary = self
                    .backend
                    .import(&collection, &records, action)
                    .await
                    .map_err(|e| {
                        error!(
                            collection = %collection,
                            action = %action,
                            count = records.len(),
                            error = %e,
                            "Failed to import documents"
                        );
                        e
                    })?;

                for result in summary.failures() {
                    if let Some(ref err) = result.error {
                        warn!(
                            collection = %collection,
                            id = %result.document_id,
                            error = %err,
                            "Document rejected by search backend"
                        );
                    }
                }

                match action {
                    ImportAction::Create => report.indexed += summary.succeeded,
                    ImportAction::Upsert => report.updated += summary.succeeded,
                }
                report.rejected += summary.failed;
                Ok(())
            }
            FlushOperation::Delete(PendingDelete {
                collection,
                document_id,
            }) => {
                self.backend
                    .delete(&collection, &document_id)
                    .await
                    .map_err(|e| {
                        error!(
                            collection = %collection,
                            id = %document_id,
                            error = %e,
                            "Failed to delete document"
                        );
                        e
                    })?;
                report.deleted += 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_sync_repository::ImportSummary;
    use search_sync_shared::{FieldDefinition, FieldType, ObjectIdentity};
    use serde_json::{json, Value};

    use crate::registry::InMemoryCollectionRegistry;
    use crate::transformer::FieldMappingTransformer;

    /// Backend that must never be reached by buffering alone.
    struct UnreachableBackend;

    #[async_trait]
    impl SearchBackend for UnreachableBackend {
        async fn import(
            &self,
            _collection: &str,
            _records: &[ChangeRecord],
            _action: ImportAction,
        ) -> Result<ImportSummary, SearchIndexError> {
            panic!("import called while buffering");
        }

        async fn delete(
            &self,
            _collection: &str,
            _document_id: &str,
        ) -> Result<(), SearchIndexError> {
            panic!("delete called while buffering");
        }
    }

    struct Note {
        identity: ObjectIdentity,
        source_type: &'static str,
        id: u64,
    }

    impl IndexableObject for Note {
        fn source_type(&self) -> SourceType {
            SourceType::new(self.source_type)
        }

        fn identity(&self) -> ObjectIdentity {
            self.identity
        }

        fn attribute(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(json!(self.id)),
                _ => None,
            }
        }
    }

    fn note(source_type: &'static str, id: u64) -> Note {
        Note {
            identity: ObjectIdentity::generate(),
            source_type,
            id,
        }
    }

    fn coordinator(fields: Vec<FieldDefinition>) -> ChangeBatchCoordinator {
        let registry: Arc<dyn CollectionRegistry> = Arc::new(
            InMemoryCollectionRegistry::new(vec![CollectionDefinition::new(
                "notes",
                "notes_v1",
                SourceType::new("Note"),
                fields,
            )])
            .unwrap(),
        );
        let transformer = Arc::new(FieldMappingTransformer::new(registry.clone()));
        ChangeBatchCoordinator::new(registry, transformer, Arc::new(UnreachableBackend))
    }

    fn well_formed() -> ChangeBatchCoordinator {
        coordinator(vec![FieldDefinition::new("id", FieldType::Primary)])
    }

    #[test]
    fn test_created_is_buffered_under_target_name() {
        let mut coordinator = well_formed();

        coordinator.on_created(&note("Note", 1)).unwrap();

        let to_index = coordinator.pending().to_index();
        assert_eq!(to_index.get("notes_v1").unwrap().len(), 1);
        assert!(to_index.get("notes").is_none());
    }

    #[test]
    fn test_unmanaged_objects_are_ignored() {
        let mut coordinator = well_formed();
        let sticky = note("Sticky", 1);

        for event in [
            LifecycleEvent::Created,
            LifecycleEvent::Updated,
            LifecycleEvent::BeforeRemoved,
            LifecycleEvent::Removed,
        ] {
            coordinator.handle(event, &sticky).unwrap();
        }

        assert!(!coordinator.is_managed(&sticky));
        assert!(coordinator.pending().is_empty());
    }

    #[test]
    fn test_update_without_primary_field_is_rejected() {
        let mut coordinator = coordinator(vec![FieldDefinition::new("title", FieldType::String)]);

        let result = coordinator.on_updated(&note("Note", 1));

        match result {
            Err(SyncError::ConfigurationError(msg)) => assert!(msg.contains("notes_v1")),
            other => panic!("expected configuration error, got {:?}", other),
        }
        assert!(coordinator.pending().to_update().is_empty());
    }

    #[test]
    fn test_update_with_two_primary_fields_is_rejected() {
        let mut coordinator = coordinator(vec![
            FieldDefinition::new("id", FieldType::Primary),
            FieldDefinition::new("legacy_id", FieldType::Primary).with_entity_attribute("id"),
        ]);

        let result = coordinator.on_updated(&note("Note", 1));

        assert!(matches!(result, Err(SyncError::ConfigurationError(_))));
        assert!(coordinator.pending().is_empty());
    }

    #[test]
    fn test_removal_requires_capture() {
        let mut coordinator = well_formed();
        let first = note("Note", 1);
        let second = note("Note", 2);

        coordinator.on_before_removed(&first).unwrap();
        assert_eq!(coordinator.pending().pending_delete_id_count(), 1);

        coordinator.on_removed(&first).unwrap();
        coordinator.on_removed(&second).unwrap();

        assert_eq!(
            coordinator.pending().to_delete(),
            &[PendingDelete {
                collection: "notes_v1".to_string(),
                document_id: "1".to_string(),
            }]
        );
        assert_eq!(coordinator.pending().pending_delete_id_count(), 0);
    }

    #[test]
    fn test_repeated_removed_notification_enqueues_once() {
        let mut coordinator = well_formed();
        let doomed = note("Note", 5);

        coordinator.on_before_removed(&doomed).unwrap();
        coordinator.on_removed(&doomed).unwrap();
        coordinator.on_removed(&doomed).unwrap();

        assert_eq!(coordinator.pending().to_delete().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_flush_makes_no_backend_calls() {
        let mut coordinator = well_formed();

        let report = coordinator.on_cycle_complete().await.unwrap();

        assert_eq!(report, FlushReport::default());
    }

    #[tokio::test]
    async fn test_flush_discards_unconsumed_captures() {
        let mut coordinator = well_formed();
        coordinator.on_before_removed(&note("Note", 3)).unwrap();

        let report = coordinator.on_cycle_complete().await.unwrap();

        assert_eq!(report, FlushReport::default());
        assert!(coordinator.pending().is_empty());
    }
}

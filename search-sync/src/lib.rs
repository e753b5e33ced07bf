//! # Search Sync
//!
//! Keeps a search index in step with domain objects persisted through a unit of
//! work. The host forwards per-object lifecycle notifications; changes are
//! buffered per collection and written to the search backend in one flush when
//! the unit of work completes.
//!
//! ## Architecture
//!
//! 1. **Registry**: Knows which source types are managed and their field layout
//! 2. **Transformer**: Converts domain objects into change records
//! 3. **Coordinator**: Buffers changes for a cycle and flushes them
//! 4. **Backend**: Receives imports and deletes (see `search-sync-repository`)
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`coordinator`]: Change batching and flushing
//! - [`registry`]: Collection definitions lookup
//! - [`transformer`]: Object to record conversion
//! - [`errors`]: Error types for search sync

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod registry;
pub mod transformer;

pub use config::{CoordinatorConfig, Dependencies, FlushPolicy};
pub use coordinator::{ChangeBatchCoordinator, FlushReport, LifecycleEvent, PendingBatch};
pub use errors::SyncError;
pub use registry::{CollectionRegistry, InMemoryCollectionRegistry};
pub use transformer::{DocumentTransformer, FieldMappingTransformer};

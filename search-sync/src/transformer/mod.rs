//! Document transformer module.
//!
//! Converts domain objects into the change records sent to the search backend.

mod field_mapping;

pub use field_mapping::FieldMappingTransformer;

use search_sync_shared::{ChangeRecord, IndexableObject};

use crate::errors::SyncError;

/// Converts a domain object into a change record.
///
/// Implementations must put the document identifier under the `id` field of the
/// returned record.
pub trait DocumentTransformer: Send + Sync {
    fn convert(&self, object: &dyn IndexableObject) -> Result<ChangeRecord, SyncError>;
}

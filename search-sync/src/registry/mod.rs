//! Collection registry.
//!
//! The registry knows which domain types are mirrored into the search index and
//! how. The coordinator reads it once at construction to classify objects, and
//! again whenever it needs a collection's definition.

mod in_memory;

pub use in_memory::InMemoryCollectionRegistry;

use search_sync_shared::{CollectionDefinition, SourceType};

/// Source of collection definitions.
pub trait CollectionRegistry: Send + Sync {
    /// Every managed source type, keyed by collection key, in declaration order.
    fn managed_types(&self) -> Vec<(String, SourceType)>;

    /// Definition of a collection by key.
    fn definition(&self, key: &str) -> Option<&CollectionDefinition>;
}

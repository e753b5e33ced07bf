use std::collections::HashSet;

use search_sync_shared::{CollectionDefinition, SourceType};

use crate::errors::SyncError;
use crate::registry::CollectionRegistry;

/// Registry backed by a fixed list of definitions.
///
/// Definitions keep their declaration order. Keys and source types must be
/// unique.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollectionRegistry {
    definitions: Vec<CollectionDefinition>,
}

impl InMemoryCollectionRegistry {
    /// Build a registry from definitions.
    ///
    /// # Returns
    ///
    /// * `Ok(InMemoryCollectionRegistry)` - If keys and source types are unique
    /// * `Err(SyncError::ConfigurationError)` - On a duplicate key or source type
    pub fn new(definitions: Vec<CollectionDefinition>) -> Result<Self, SyncError> {
        Self::check_unique(&definitions)?;
        Ok(Self { definitions })
    }

    fn check_unique(definitions: &[CollectionDefinition]) -> Result<(), SyncError> {
        let mut keys = HashSet::new();
        let mut source_types = HashSet::new();

        for definition in definitions {
            if !keys.insert(definition.key.as_str()) {
                return Err(SyncError::configuration(format!(
                    "collection key '{}' is defined more than once",
                    definition.key
                )));
            }
            if !source_types.insert(&definition.source_type) {
                return Err(SyncError::configuration(format!(
                    "source type '{}' is mapped to more than one collection",
                    definition.source_type
                )));
            }
        }

        Ok(())
    }

    /// Definition fed from a source type.
    pub fn definition_for(&self, source_type: &SourceType) -> Option<&CollectionDefinition> {
        self.definitions
            .iter()
            .find(|definition| &definition.source_type == source_type)
    }

    pub fn definitions(&self) -> &[CollectionDefinition] {
        &self.definitions
    }
}

impl CollectionRegistry for InMemoryCollectionRegistry {
    fn managed_types(&self) -> Vec<(String, SourceType)> {
        self.definitions
            .iter()
            .map(|definition| (definition.key.clone(), definition.source_type.clone()))
            .collect()
    }

    fn definition(&self, key: &str) -> Option<&CollectionDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.key == key)
    }
}

//! OpenSearch index naming.
//!
//! Collection names coming from collection definitions are mapped onto index
//! names here. Index settings and mappings are managed outside this crate.

/// Configuration for mapping collections onto OpenSearch indices.
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Optional prefix prepended to every collection name (e.g. "staging_").
    pub prefix: Option<String>,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix prepended to every collection name
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Get the index name for a collection.
    ///
    /// Index names in OpenSearch must be lowercase, so the result is lowercased.
    pub fn index_name(&self, collection: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, collection).to_lowercase(),
            None => collection.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name_without_prefix() {
        let config = IndexConfig::default();
        assert_eq!(config.index_name("Articles"), "articles");
    }

    #[test]
    fn test_index_name_with_prefix() {
        let config = IndexConfig::new("staging_");
        assert_eq!(config.index_name("articles"), "staging_articles");
    }
}

//! Collection definition types.
//!
//! A collection definition describes how one domain type maps onto one search
//! collection: the collection's name in the backend, the source type it is fed
//! from, and the ordered list of fields extracted from each object.

use serde::{Deserialize, Serialize};

use crate::types::object::SourceType;

/// Type of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// The document identifier. Exactly one field per collection has this type.
    Primary,
    String,
    Int32,
    Int64,
    Float,
    Bool,
    /// Timestamp, stored as Unix seconds.
    Datetime,
    #[serde(rename = "string[]")]
    StringArray,
}

/// Definition of a single collection field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name in the search document.
    pub name: String,
    /// Field type, used to cast the source value.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Attribute of the source object the value is read from. Defaults to `name`.
    /// Dotted paths (`author.name`) descend into nested objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_attribute: Option<String>,
    /// Whether a missing value may be left out of the document.
    #[serde(default)]
    pub optional: bool,
}

impl FieldDefinition {
    /// Create a required field reading the attribute of the same name.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            entity_attribute: None,
            optional: false,
        }
    }

    /// Read the value from a differently-named attribute.
    pub fn with_entity_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.entity_attribute = Some(attribute.into());
        self
    }

    /// Mark the field as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The attribute path the value is read from.
    pub fn attribute_path(&self) -> &str {
        self.entity_attribute.as_deref().unwrap_or(&self.name)
    }
}

/// Definition of a search collection fed from one source type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    /// Stable key identifying the definition in the registry.
    pub key: String,
    /// Name of the collection in the search backend.
    pub target_name: String,
    /// Ordered field definitions.
    pub fields: Vec<FieldDefinition>,
    /// Type tag of the domain objects stored in this collection.
    pub source_type: SourceType,
}

impl CollectionDefinition {
    /// Create a new collection definition.
    ///
    /// # Example
    ///
    /// ```
    /// use search_sync_shared::{CollectionDefinition, FieldDefinition, FieldType, SourceType};
    ///
    /// let definition = CollectionDefinition::new(
    ///     "articles",
    ///     "articles_v1",
    ///     SourceType::new("Article"),
    ///     vec![
    ///         FieldDefinition::new("id", FieldType::Primary),
    ///         FieldDefinition::new("title", FieldType::String),
    ///     ],
    /// );
    /// assert!(definition.is_well_formed());
    /// ```
    pub fn new(
        key: impl Into<String>,
        target_name: impl Into<String>,
        source_type: SourceType,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            key: key.into(),
            target_name: target_name.into(),
            fields,
            source_type,
        }
    }

    /// Number of fields typed as `primary`.
    pub fn primary_field_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| field.field_type == FieldType::Primary)
            .count()
    }

    /// The primary field, if exactly one is defined.
    pub fn primary_field(&self) -> Option<&FieldDefinition> {
        if !self.is_well_formed() {
            return None;
        }
        self.fields
            .iter()
            .find(|field| field.field_type == FieldType::Primary)
    }

    /// A definition is well-formed when exactly one field is typed as `primary`.
    pub fn is_well_formed(&self) -> bool {
        self.primary_field_count() == 1
    }
}

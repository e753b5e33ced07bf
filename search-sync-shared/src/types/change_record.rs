//! Change record types for the search index.
//!
//! A change record is the plain field/value document produced from a domain
//! object and sent to the search backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the field every converted record carries its document identifier under.
pub const ID_FIELD: &str = "id";

/// Document representation sent to the search backend.
///
/// The record is a flat mapping from field name to JSON value. Once produced by a
/// transformer it always contains an [`ID_FIELD`] entry; everything else is opaque
/// to the coordinator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ChangeRecord {
    fields: Map<String, Value>,
}

impl ChangeRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record holding only a document identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use search_sync_shared::ChangeRecord;
    ///
    /// let record = ChangeRecord::with_id("42");
    /// assert_eq!(record.id().as_deref(), Some("42"));
    /// ```
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(ID_FIELD, Value::String(id.into()));
        record
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Builder-style variant of [`ChangeRecord::insert`].
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The document identifier, if present.
    ///
    /// String identifiers are returned as-is and numeric identifiers are
    /// stringified. Any other value type yields `None`.
    pub fn id(&self) -> Option<String> {
        match self.fields.get(ID_FIELD)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Borrow the underlying field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Convert the record into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for ChangeRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

//! Field-mapping transformer implementation.
//!
//! Builds records from the field list of the object's collection definition,
//! casting every attribute value to its declared field type.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::{Number, Value};

use search_sync_shared::types::change_record::ID_FIELD;
use search_sync_shared::{ChangeRecord, FieldDefinition, FieldType, IndexableObject, SourceType};

use crate::errors::SyncError;
use crate::registry::CollectionRegistry;
use crate::transformer::DocumentTransformer;

/// Transformer driven by collection definitions.
///
/// For each field of the object's collection:
/// - the value is read from the field's attribute path, descending into nested
///   objects for dotted paths;
/// - the `primary` field is written under `id` as a string;
/// - missing values are skipped for optional fields and written as `null` otherwise;
/// - any other value is cast to the field type, failing with a conversion error
///   when it cannot be.
pub struct FieldMappingTransformer {
    registry: Arc<dyn CollectionRegistry>,
    keys_by_type: HashMap<SourceType, String>,
}

impl FieldMappingTransformer {
    /// Create a new transformer reading definitions from the registry.
    pub fn new(registry: Arc<dyn CollectionRegistry>) -> Self {
        let keys_by_type = registry
            .managed_types()
            .into_iter()
            .map(|(key, source_type)| (source_type, key))
            .collect();

        Self {
            registry,
            keys_by_type,
        }
    }

    /// Read an attribute path. `null` is treated as missing.
    fn read_attribute(object: &dyn IndexableObject, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let mut value = object.attribute(segments.next()?)?;

        for segment in segments {
            value = value.get(segment)?.clone();
        }

        match value {
            Value::Null => None,
            value => Some(value),
        }
    }

    fn cast_primary(value: Value) -> Result<String, String> {
        match value {
            Value::String(id) if !id.is_empty() => Ok(id),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(format!("cannot use {} as a document id", other)),
        }
    }

    fn cast_integer(value: Value, bounds: Option<(i64, i64)>) -> Result<Value, String> {
        let number = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("expected an integer, got {}", value))?;

        if let Some((min, max)) = bounds {
            if number < min || number > max {
                return Err(format!("{} is out of range for int32", number));
            }
        }
        Ok(Value::Number(number.into()))
    }

    fn cast_float(value: Value) -> Result<Value, String> {
        let number = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| format!("expected a number, got {}", value))?;

        Number::from_f64(number)
            .map(Value::Number)
            .ok_or_else(|| format!("{} is not a finite number", number))
    }

    fn cast_datetime(value: Value) -> Result<Value, String> {
        match value {
            Value::Number(n) if n.is_i64() => Ok(Value::Number(n)),
            Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .map(|datetime| Value::Number(datetime.timestamp().into()))
                .map_err(|e| format!("invalid datetime '{}': {}", s, e)),
            other => Err(format!("expected an RFC 3339 datetime, got {}", other)),
        }
    }

    fn cast_scalar_string(value: Value) -> Result<String, String> {
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(format!("expected a scalar, got {}", other)),
        }
    }

    fn cast_value(field_type: FieldType, value: Value) -> Result<Value, String> {
        match field_type {
            FieldType::Primary => Self::cast_primary(value).map(Value::String),
            FieldType::String => Self::cast_scalar_string(value).map(Value::String),
            FieldType::Int32 => {
                Self::cast_integer(value, Some((i32::MIN as i64, i32::MAX as i64)))
            }
            FieldType::Int64 => Self::cast_integer(value, None),
            FieldType::Float => Self::cast_float(value),
            FieldType::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                other => Err(format!("expected a boolean, got {}", other)),
            },
            FieldType::Datetime => Self::cast_datetime(value),
            FieldType::StringArray => {
                let items = match value {
                    Value::Array(items) => items,
                    scalar => vec![scalar],
                };
                items
                    .into_iter()
                    .filter(|item| !item.is_null())
                    .map(|item| Self::cast_scalar_string(item).map(Value::String))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }

    fn convert_field(
        record: &mut ChangeRecord,
        collection: &str,
        field: &FieldDefinition,
        value: Option<Value>,
    ) -> Result<(), SyncError> {
        let name = if field.field_type == FieldType::Primary {
            ID_FIELD
        } else {
            field.name.as_str()
        };

        let value = match value {
            Some(value) => value,
            None if field.field_type == FieldType::Primary => {
                return Err(SyncError::conversion(format!(
                    "collection '{}': primary field '{}' has no value",
                    collection, field.name
                )))
            }
            None if field.optional => return Ok(()),
            None => {
                record.insert(name, Value::Null);
                return Ok(());
            }
        };

        let cast = Self::cast_value(field.field_type, value).map_err(|reason| {
            SyncError::conversion(format!(
                "collection '{}', field '{}': {}",
                collection, field.name, reason
            ))
        })?;
        record.insert(name, cast);
        Ok(())
    }
}

impl DocumentTransformer for FieldMappingTransformer {
    fn convert(&self, object: &dyn IndexableObject) -> Result<ChangeRecord, SyncError> {
        let source_type = object.source_type();
        let key = self.keys_by_type.get(&source_type).ok_or_else(|| {
            SyncError::conversion(format!("type '{}' is not managed", source_type))
        })?;
        let definition = self.registry.definition(key).ok_or_else(|| {
            SyncError::configuration(format!("no definition for collection '{}'", key))
        })?;

        let mut record = ChangeRecord::new();
        for field in &definition.fields {
            let value = Self::read_attribute(object, field.attribute_path());
            Self::convert_field(&mut record, &definition.key, field, value)?;
        }

        if record.id().is_none() {
            return Err(SyncError::conversion(format!(
                "collection '{}' has no primary field",
                definition.key
            )));
        }

        Ok(record)
    }
}

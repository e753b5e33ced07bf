//! This module defines the core data structures used across the search sync crates.
//! It re-exports the record, definition and object types.

pub mod change_record;
pub mod collection_definition;
pub mod object;

pub use change_record::ChangeRecord;
pub use collection_definition::{CollectionDefinition, FieldDefinition, FieldType};
pub use object::{IndexableObject, ObjectIdentity, SourceType};

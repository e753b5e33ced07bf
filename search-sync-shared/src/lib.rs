//! # Search Sync Shared
//!
//! This crate defines the data structures shared across the search sync workspace:
//! the records sent to the search backend, the collection definitions that describe
//! how domain objects map onto search collections, and the trait host objects
//! implement to take part in synchronization.

pub mod types;

pub use types::change_record::ChangeRecord;
pub use types::collection_definition::{CollectionDefinition, FieldDefinition, FieldType};
pub use types::object::{IndexableObject, ObjectIdentity, SourceType};

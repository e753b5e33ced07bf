//! Host object types.
//!
//! Domain objects taking part in search synchronization implement
//! [`IndexableObject`]. The trait exposes the three things the coordinator and
//! transformer need: a type tag to classify the object, an identity token to
//! correlate removal notifications, and attribute access to build documents.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable type tag of a domain object.
///
/// Proxy or wrapper objects must report the tag of the type they wrap, so that a
/// lazily-loaded proxy is classified exactly like the real object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceType(String);

impl SourceType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Identity token of a live domain object.
///
/// The token must stay stable for the object's remaining lifetime and must not be
/// handed to another object while the first one is still part of an open unit of
/// work. Hosts typically assign one with [`ObjectIdentity::generate`] when the
/// object is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectIdentity(Uuid);

impl ObjectIdentity {
    /// Assign a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an identity from a host-side surrogate number.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ObjectIdentity {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted domain object that can be mirrored into the search index.
pub trait IndexableObject {
    /// The object's resolved type tag.
    fn source_type(&self) -> SourceType;

    /// The object's identity token.
    fn identity(&self) -> ObjectIdentity;

    /// Read an attribute by name.
    ///
    /// Returns `None` when the attribute does not exist or is unset.
    fn attribute(&self, name: &str) -> Option<Value>;
}

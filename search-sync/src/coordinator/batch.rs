//! Per-cycle change buffers.

use std::collections::HashMap;

use search_sync_shared::{ChangeRecord, ObjectIdentity};

/// Records grouped by collection, collections kept in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct CollectionBuffer {
    groups: Vec<(String, Vec<ChangeRecord>)>,
}

impl CollectionBuffer {
    /// Append a record to a collection's group.
    pub fn push(&mut self, collection: &str, record: ChangeRecord) {
        match self.groups.iter_mut().find(|(name, _)| name == collection) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((collection.to_string(), vec![record])),
        }
    }

    /// Records buffered for a collection.
    pub fn get(&self, collection: &str) -> Option<&[ChangeRecord]> {
        self.groups
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ChangeRecord])> {
        self.groups
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Number of collections with buffered records.
    pub fn collection_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of buffered records.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl IntoIterator for CollectionBuffer {
    type Item = (String, Vec<ChangeRecord>);
    type IntoIter = std::vec::IntoIter<(String, Vec<ChangeRecord>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// A document queued for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub collection: String,
    pub document_id: String,
}

/// Everything buffered during one unit of work.
///
/// The coordinator owns exactly one batch and swaps it for an empty one when it
/// flushes, so a batch never outlives its cycle.
#[derive(Debug, Default)]
pub struct PendingBatch {
    pub(crate) to_index: CollectionBuffer,
    pub(crate) to_update: CollectionBuffer,
    pub(crate) to_delete: Vec<PendingDelete>,
    pub(crate) pending_delete_ids: HashMap<ObjectIdentity, String>,
}

impl PendingBatch {
    /// Records to insert, by collection.
    pub fn to_index(&self) -> &CollectionBuffer {
        &self.to_index
    }

    /// Records to upsert, by collection.
    pub fn to_update(&self) -> &CollectionBuffer {
        &self.to_update
    }

    /// Documents to delete, in removal order.
    pub fn to_delete(&self) -> &[PendingDelete] {
        &self.to_delete
    }

    /// Number of identifiers captured ahead of a removal and not consumed yet.
    pub fn pending_delete_id_count(&self) -> usize {
        self.pending_delete_ids.len()
    }

    /// Store an identifier captured before removal.
    ///
    /// The first capture for an identity wins; returns `false` if one was already stored.
    pub(crate) fn capture_delete_id(&mut self, identity: ObjectIdentity, document_id: String) -> bool {
        if self.pending_delete_ids.contains_key(&identity) {
            return false;
        }
        self.pending_delete_ids.insert(identity, document_id);
        true
    }

    /// Consume the identifier captured for an identity.
    pub(crate) fn take_delete_id(&mut self, identity: &ObjectIdentity) -> Option<String> {
        self.pending_delete_ids.remove(identity)
    }

    /// Number of backend operations a flush of this batch performs.
    pub fn operation_count(&self) -> usize {
        self.to_index.collection_count() + self.to_update.collection_count() + self.to_delete.len()
    }

    /// Whether all buffers and the identifier map are empty.
    pub fn is_empty(&self) -> bool {
        self.to_index.is_empty()
            && self.to_update.is_empty()
            && self.to_delete.is_empty()
            && self.pending_delete_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_buffer_groups_in_first_seen_order() {
        let mut buffer = CollectionBuffer::default();
        buffer.push("articles", ChangeRecord::with_id("1"));
        buffer.push("authors", ChangeRecord::with_id("2"));
        buffer.push("articles", ChangeRecord::with_id("3"));

        let groups: Vec<(&str, usize)> = buffer
            .iter()
            .map(|(name, records)| (name, records.len()))
            .collect();
        assert_eq!(groups, vec![("articles", 2), ("authors", 1)]);
        assert_eq!(buffer.record_count(), 3);
        assert_eq!(buffer.get("articles").unwrap()[1].id().as_deref(), Some("3"));
        assert!(buffer.get("missing").is_none());
    }

    #[test]
    fn test_capture_is_write_once_and_consumed() {
        let mut batch = PendingBatch::default();
        let identity = ObjectIdentity::from_u128(9);

        assert!(batch.capture_delete_id(identity, "42".to_string()));
        assert!(!batch.capture_delete_id(identity, "43".to_string()));
        assert_eq!(batch.pending_delete_id_count(), 1);

        assert_eq!(batch.take_delete_id(&identity), Some("42".to_string()));
        assert_eq!(batch.take_delete_id(&identity), None);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_operation_count() {
        let mut batch = PendingBatch::default();
        batch.to_index.push("articles", ChangeRecord::with_id("1"));
        batch.to_index.push("articles", ChangeRecord::with_id("2"));
        batch.to_update.push("authors", ChangeRecord::with_id("3"));
        batch.to_delete.push(PendingDelete {
            collection: "articles".to_string(),
            document_id: "4".to_string(),
        });

        assert_eq!(batch.operation_count(), 3);
        assert!(!batch.is_empty());
    }
}

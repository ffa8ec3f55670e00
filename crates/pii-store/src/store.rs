//! In-memory document collection implementing the persistence contract the
//! sealing layer relies on.
//!
//! Three guarantees matter here:
//!
//! - **Atomic per-document commits.** An insert or update replaces the whole
//!   document under one write lock, so a sealed ciphertext and its digest
//!   always land together.
//! - **Sparse-unique constraints.** Declared unique index slots reject a
//!   second live document with the same digest; documents without a digest in
//!   that slot are exempt.
//! - **Equality lookup on index slots.** Lookups match digests with plain
//!   string equality and never touch ciphertext.
//!
//! This is a reference store, not an engine: lookups scan. Concurrent writes
//! to different documents still serialise on the collection lock, which is
//! the per-document write ordering the sealing layer assumes.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A stored document: field name to JSON value.
pub type Document = serde_json::Map<String, Value>;

/// Errors produced by the collection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index slot already holds this digest in another document.
    #[error("unique index violation on `{field}`")]
    DuplicateIndex {
        /// The offending index field.
        field: String,
    },

    /// No document with this id exists.
    #[error("document not found: {0}")]
    NotFound(Uuid),
}

/// A collection of documents with sparse-unique index enforcement.
#[derive(Debug)]
pub struct Collection {
    unique_index_fields: Vec<String>,
    inner: RwLock<HashMap<Uuid, Document>>,
}

impl Collection {
    /// Create an empty collection enforcing uniqueness on `unique_index_fields`.
    pub fn new(unique_index_fields: Vec<String>) -> Self {
        Self {
            unique_index_fields,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new document, assigning it a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateIndex`] if a unique index slot collides
    /// with a live document; nothing is written in that case.
    pub fn insert(&self, doc: Document) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let mut inner = self.inner.write();
        self.check_unique(&inner, None, &doc)?;
        inner.insert(id, doc);
        Ok(id)
    }

    /// Apply a change-set to an existing document.
    ///
    /// Keys of `changes` overwrite the stored fields; a `null` value removes
    /// the field entirely, which is how cleared optional fields and their
    /// index slots end up absent rather than stale. The merged document is
    /// validated against the unique constraints and then swapped in whole.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::DuplicateIndex`] on a constraint violation; the stored
    /// document is unchanged on any error.
    pub fn update(&self, id: Uuid, changes: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let current = inner.get(&id).ok_or(StoreError::NotFound(id))?;

        let mut next = current.clone();
        for (key, value) in changes {
            if value.is_null() {
                next.remove(&key);
            } else {
                next.insert(key, value);
            }
        }

        self.check_unique(&inner, Some(id), &next)?;
        inner.insert(id, next);
        Ok(())
    }

    /// Fetch a copy of a document.
    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.inner.read().get(&id).cloned()
    }

    /// Remove a document, returning it if it existed.
    pub fn remove(&self, id: Uuid) -> Option<Document> {
        self.inner.write().remove(&id)
    }

    /// Find the first document whose `index_field` equals `digest`.
    pub fn find_by_index(&self, index_field: &str, digest: &str) -> Option<(Uuid, Document)> {
        self.inner
            .read()
            .iter()
            .find(|(_, doc)| doc.get(index_field).and_then(Value::as_str) == Some(digest))
            .map(|(id, doc)| (*id, doc.clone()))
    }

    /// Find every document whose `index_field` equals `digest`.
    pub fn find_all_by_index(&self, index_field: &str, digest: &str) -> Vec<(Uuid, Document)> {
        self.inner
            .read()
            .iter()
            .filter(|(_, doc)| doc.get(index_field).and_then(Value::as_str) == Some(digest))
            .map(|(id, doc)| (*id, doc.clone()))
            .collect()
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_unique(
        &self,
        docs: &HashMap<Uuid, Document>,
        exempt: Option<Uuid>,
        candidate: &Document,
    ) -> Result<(), StoreError> {
        for field in &self.unique_index_fields {
            // Sparse: no digest, no constraint.
            let Some(digest) = candidate.get(field).and_then(Value::as_str) else {
                continue;
            };
            let taken = docs.iter().any(|(id, doc)| {
                Some(*id) != exempt && doc.get(field).and_then(Value::as_str) == Some(digest)
            });
            if taken {
                return Err(StoreError::DuplicateIndex {
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().unwrap().clone()
    }

    fn collection() -> Collection {
        Collection::new(vec!["email_hash".into()])
    }

    #[test]
    fn insert_and_get() {
        let c = collection();
        let id = c.insert(doc(json!({ "name": "Ada" }))).unwrap();
        assert_eq!(c.get(id).unwrap()["name"], json!("Ada"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn unique_index_rejects_duplicate_digest() {
        let c = collection();
        c.insert(doc(json!({ "email_hash": "d1" }))).unwrap();
        let err = c.insert(doc(json!({ "email_hash": "d1" }))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIndex { field } if field == "email_hash"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn sparse_unique_allows_missing_digests() {
        let c = collection();
        c.insert(doc(json!({ "name": "a" }))).unwrap();
        c.insert(doc(json!({ "name": "b" }))).unwrap();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn update_merges_and_removes_null_fields() {
        let c = collection();
        let id = c
            .insert(doc(json!({ "name": "Ada", "phone_number": "123", "phone_number_hash": "d" })))
            .unwrap();

        c.update(id, doc(json!({ "phone_number": "456", "phone_number_hash": null })))
            .unwrap();

        let stored = c.get(id).unwrap();
        assert_eq!(stored["phone_number"], json!("456"));
        assert!(!stored.contains_key("phone_number_hash"));
        assert_eq!(stored["name"], json!("Ada"));
    }

    #[test]
    fn update_rejects_digest_held_by_other_document() {
        let c = collection();
        c.insert(doc(json!({ "email_hash": "d1" }))).unwrap();
        let id2 = c.insert(doc(json!({ "email_hash": "d2" }))).unwrap();

        let err = c.update(id2, doc(json!({ "email_hash": "d1" }))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIndex { .. }));
        // The losing write left the document untouched.
        assert_eq!(c.get(id2).unwrap()["email_hash"], json!("d2"));
    }

    #[test]
    fn update_allows_rewriting_own_digest() {
        let c = collection();
        let id = c.insert(doc(json!({ "email_hash": "d1" }))).unwrap();
        c.update(id, doc(json!({ "email_hash": "d1" }))).unwrap();
    }

    #[test]
    fn update_unknown_id_fails() {
        let c = collection();
        assert!(matches!(
            c.update(Uuid::new_v4(), Document::new()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn find_by_index_matches_digest_equality() {
        let c = collection();
        let id = c
            .insert(doc(json!({ "email_hash": "d1", "email": "iv:ct" })))
            .unwrap();

        let (found_id, found) = c.find_by_index("email_hash", "d1").unwrap();
        assert_eq!(found_id, id);
        assert_eq!(found["email"], json!("iv:ct"));
        assert!(c.find_by_index("email_hash", "other").is_none());
    }

    #[test]
    fn find_all_by_index_returns_every_match() {
        let c = Collection::new(Vec::new());
        c.insert(doc(json!({ "email_hash": "d" }))).unwrap();
        c.insert(doc(json!({ "email_hash": "d" }))).unwrap();
        c.insert(doc(json!({ "email_hash": "other" }))).unwrap();
        assert_eq!(c.find_all_by_index("email_hash", "d").len(), 2);
    }

    #[test]
    fn remove_deletes_document_and_its_index_entries() {
        let c = collection();
        let id = c.insert(doc(json!({ "email_hash": "d1" }))).unwrap();
        assert!(c.remove(id).is_some());
        assert!(c.get(id).is_none());
        // The digest is free again.
        c.insert(doc(json!({ "email_hash": "d1" }))).unwrap();
    }
}

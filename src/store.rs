//! In-memory object table.
//!
//! The store is the single home of every object in a document and the owner
//! of the referrer bookkeeping primitives. It hands out identifiers, answers
//! kind/property lookups, and guards removal: an object that is still
//! referenced cannot be removed.
//!
//! ## Limitations
//!
//! - **Single-writer only**: per-table locks make multi-step mutations
//!   non-atomic. Callers needing concurrent access serialize externally,
//!   one mutation in flight per document at a time.
//! - **No persistence**: the store is purely in memory; serialization is the
//!   document layer's concern and is gated on reachability there.

use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::model::{Object, ObjectId, PropertyMap, Value};
use crate::{Error, Result};

// ============================================================================
// ObjectStore
// ============================================================================

/// Id-keyed table of document objects.
#[derive(Debug)]
pub struct ObjectStore {
    objects: RwLock<HashMap<ObjectId, Object>>,
    next_id: AtomicU64,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // ========================================================================
    // Object CRUD
    // ========================================================================

    /// Allocate an identifier and insert a new object.
    pub fn create(&self, kind: impl Into<String>, props: PropertyMap) -> ObjectId {
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut object = Object::new(id, kind);
        object.properties = props;
        self.objects.write().insert(id, object);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<Object> {
        self.objects.read().get(&id).cloned()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.read().contains_key(&id)
    }

    pub fn kind_of(&self, id: ObjectId) -> Option<String> {
        self.objects.read().get(&id).map(|o| o.kind.clone())
    }

    /// Remove an object. Fails while any referrer remains, so a member of a
    /// live relationship can never be dropped out from under it.
    pub fn remove(&self, id: ObjectId) -> Result<Object> {
        let mut objects = self.objects.write();
        let object = objects
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        if object.is_referenced() {
            let count = object.referrers.len();
            objects.insert(id, object);
            return Err(Error::ConstraintViolation(format!(
                "cannot remove object {id} with {count} live referrer(s)"
            )));
        }
        Ok(object)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Set a plain data property.
    ///
    /// Values containing `Value::Ref` are rejected here: references are only
    /// written through the document's reference API, where the target's
    /// referrer multiset is updated in the same step.
    pub fn set_property(&self, id: ObjectId, key: &str, val: Value) -> Result<()> {
        if val.contains_ref() {
            return Err(Error::ConstraintViolation(format!(
                "property `{key}` on object {id} holds an object reference; \
                 use the reference API so referrer bookkeeping stays balanced"
            )));
        }
        self.set_raw_property(id, key, val)
    }

    /// Unchecked property write. Crate-internal: the document's reference
    /// API uses this after doing its own bookkeeping.
    pub(crate) fn set_raw_property(&self, id: ObjectId, key: &str, val: Value) -> Result<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        object.properties.insert(key.to_string(), val);
        Ok(())
    }

    pub fn get_property(&self, id: ObjectId, key: &str) -> Option<Value> {
        self.objects.read().get(&id).and_then(|o| o.get(key).cloned())
    }

    pub fn remove_property(&self, id: ObjectId, key: &str) -> Result<Option<Value>> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        Ok(object.properties.remove(key))
    }

    // ========================================================================
    // Referrer bookkeeping
    // ========================================================================

    /// Record one occurrence of `owner` referencing `id`.
    pub fn add_referrer(&self, id: ObjectId, owner: ObjectId) -> Result<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        object.add_referrer(owner);
        Ok(())
    }

    /// Drop exactly one occurrence of `owner` from `id`'s referrer multiset.
    ///
    /// A missing occurrence means membership and bookkeeping have diverged
    /// somewhere outside the vetted mutation paths; surfaced loudly rather
    /// than ignored.
    pub fn remove_referrer(&self, id: ObjectId, owner: ObjectId) -> Result<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("object {id}")))?;
        if object.remove_referrer(owner) {
            Ok(())
        } else {
            Err(Error::ConstraintViolation(format!(
                "object {id} has no referrer occurrence for owner {owner}"
            )))
        }
    }

    /// Occurrences of `owner` in `id`'s referrer multiset. Zero for unknown ids.
    pub fn referrer_count(&self, id: ObjectId, owner: ObjectId) -> usize {
        self.objects
            .read()
            .get(&id)
            .map(|o| o.referrer_count(owner))
            .unwrap_or(0)
    }

    /// Full referrer multiset of `id`, in registration order.
    pub fn referrers(&self, id: ObjectId) -> Vec<ObjectId> {
        self.objects
            .read()
            .get(&id)
            .map(|o| o.referrers.to_vec())
            .unwrap_or_default()
    }

    /// Targets of `id`'s single-valued reference properties.
    pub fn references_of(&self, id: ObjectId) -> Vec<ObjectId> {
        self.objects
            .read()
            .get(&id)
            .map(|o| o.properties.values().filter_map(Value::as_ref_id).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Scan
    // ========================================================================

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All identifiers, ascending.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects.read().keys().copied().collect();
        ids.sort();
        ids
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = ObjectStore::new();
        let mut props = PropertyMap::new();
        props.insert("name".into(), Value::from("Sources"));

        let id = store.create("Group", props);
        let object = store.get(id).unwrap();

        assert_eq!(object.kind, "Group");
        assert_eq!(object.get("name"), Some(&Value::from("Sources")));
        assert_eq!(store.kind_of(id).as_deref(), Some("Group"));
    }

    #[test]
    fn test_referrer_bookkeeping_is_a_multiset() {
        let store = ObjectStore::new();
        let owner = store.create("Target", PropertyMap::new());
        let member = store.create("BuildStep", PropertyMap::new());

        store.add_referrer(member, owner).unwrap();
        store.add_referrer(member, owner).unwrap();
        assert_eq!(store.referrer_count(member, owner), 2);

        store.remove_referrer(member, owner).unwrap();
        assert_eq!(store.referrer_count(member, owner), 1);

        store.remove_referrer(member, owner).unwrap();
        assert!(store.remove_referrer(member, owner).is_err());
    }

    #[test]
    fn test_cannot_remove_referenced_object() {
        let store = ObjectStore::new();
        let owner = store.create("Target", PropertyMap::new());
        let member = store.create("BuildStep", PropertyMap::new());

        store.add_referrer(member, owner).unwrap();
        assert!(store.remove(member).is_err());

        store.remove_referrer(member, owner).unwrap();
        assert!(store.remove(member).is_ok());
        assert!(!store.contains(member));
    }

    #[test]
    fn test_plain_property_rejects_references() {
        let store = ObjectStore::new();
        let a = store.create("Group", PropertyMap::new());
        let b = store.create("FileRef", PropertyMap::new());

        let err = store.set_property(a, "main_file", Value::Ref(b)).unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
        assert_eq!(store.get_property(a, "main_file"), None);
    }

    #[test]
    fn test_references_of_scans_properties() {
        let store = ObjectStore::new();
        let a = store.create("Group", PropertyMap::new());
        let b = store.create("FileRef", PropertyMap::new());

        store.set_raw_property(a, "main_file", Value::Ref(b)).unwrap();
        assert_eq!(store.references_of(a), vec![b]);
    }
}

//! Object in the project document graph.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{PropertyMap, Value};

/// Opaque object identifier, stable for the lifetime of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A uniquely-identified object in the document graph.
///
/// `referrers` is a multiset: an owner appears once per occurrence through
/// which it currently references this object (one per list slot, one per
/// single-valued reference). The store and the relationship container keep
/// it balanced; `Object` itself never deduplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    /// Class tag, e.g. `"BuildStep"` or `"FileRef"`.
    pub kind: String,
    pub properties: PropertyMap,
    pub referrers: SmallVec<[ObjectId; 4]>,
}

impl Object {
    pub fn new(id: ObjectId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            properties: PropertyMap::new(),
            referrers: SmallVec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Record one more occurrence of `owner` referencing this object.
    pub fn add_referrer(&mut self, owner: ObjectId) {
        self.referrers.push(owner);
    }

    /// Drop exactly one occurrence of `owner`. Returns false if none exists.
    pub fn remove_referrer(&mut self, owner: ObjectId) -> bool {
        match self.referrers.iter().position(|r| *r == owner) {
            Some(pos) => {
                self.referrers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of occurrences of `owner` in the referrer multiset.
    pub fn referrer_count(&self, owner: ObjectId) -> usize {
        self.referrers.iter().filter(|r| **r == owner).count()
    }

    /// True if any owner currently references this object.
    pub fn is_referenced(&self) -> bool {
        !self.referrers.is_empty()
    }
}

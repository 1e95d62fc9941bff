//! Project document — the object graph as a whole.
//!
//! A `Document` owns the object store, the ordered relationship containers,
//! and the root set. It layers on top of the container core:
//!
//! - single-valued references with the same referrer bookkeeping the
//!   containers use for list membership,
//! - reachability from the roots, and pruning of what falls off,
//! - a global integrity check (recorded referrers vs actual membership),
//! - a serializable snapshot restricted to the reachable subgraph — an
//!   object nothing reaches never makes it into serialized output.
//!
//! Lock order is lists-then-objects; no path acquires them in reverse.

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::list::ObjectList;
use crate::model::{AttributeDef, ListEntry, Object, ObjectId, PropertyMap, Value};
use crate::store::ObjectStore;
use crate::{Error, Result};

// ============================================================================
// Document
// ============================================================================

/// An in-memory project document: objects, relationships, roots.
#[derive(Debug, Default)]
pub struct Document {
    store: ObjectStore,
    /// (owner, attribute name) → container. One container per pair.
    lists: RwLock<HashMap<(ObjectId, String), ObjectList>>,
    roots: RwLock<Vec<ObjectId>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying object table (for direct store-level access).
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    // ========================================================================
    // Objects and roots
    // ========================================================================

    pub fn create_object(&self, kind: impl Into<String>, props: PropertyMap) -> ObjectId {
        let kind = kind.into();
        let id = self.store.create(kind.clone(), props);
        trace!(%id, kind = %kind, "created object");
        id
    }

    /// Mark an existing object as a serialization root. Idempotent.
    pub fn add_root(&self, id: ObjectId) -> Result<()> {
        if !self.store.contains(id) {
            return Err(Error::NotFound(format!("object {id}")));
        }
        let mut roots = self.roots.write();
        if !roots.contains(&id) {
            roots.push(id);
        }
        Ok(())
    }

    pub fn roots(&self) -> Vec<ObjectId> {
        self.roots.read().clone()
    }

    /// Remove a single object that nothing references and that is not a
    /// root, clearing its own relationships and references first.
    pub fn remove_object(&self, id: ObjectId) -> Result<Object> {
        if self.roots.read().contains(&id) {
            return Err(Error::ConstraintViolation(format!(
                "object {id} is a document root"
            )));
        }
        if !self.store.contains(id) {
            return Err(Error::NotFound(format!("object {id}")));
        }
        if !self.store.referrers(id).is_empty() {
            return Err(Error::ConstraintViolation(format!(
                "cannot remove object {id} while it is still referenced"
            )));
        }
        self.detach_owned_edges(&[id])?;
        self.store.remove(id)
    }

    // ========================================================================
    // Ordered relationships
    // ========================================================================

    /// Create the empty container for `owner`'s `attribute` relationship.
    pub fn define_list(&self, owner: ObjectId, attribute: AttributeDef) -> Result<()> {
        if !self.store.contains(owner) {
            return Err(Error::NotFound(format!("object {owner}")));
        }
        let key = (owner, attribute.name().to_string());
        let mut lists = self.lists.write();
        if lists.contains_key(&key) {
            return Err(Error::ConstraintViolation(format!(
                "relationship `{}` already defined on owner {owner}",
                attribute.name()
            )));
        }
        lists.insert(key, ObjectList::new(owner, attribute));
        Ok(())
    }

    pub fn has_list(&self, owner: ObjectId, attr: &str) -> bool {
        self.lists.read().contains_key(&(owner, attr.to_string()))
    }

    /// Exclusive access to one container plus the store — the mutation path
    /// for document-held relationships.
    ///
    /// ```rust
    /// # use projgraph::{Document, AttributeDef, PropertyMap};
    /// # fn main() -> projgraph::Result<()> {
    /// let doc = Document::new();
    /// let target = doc.create_object("Target", PropertyMap::new());
    /// let step = doc.create_object("BuildStep", PropertyMap::new());
    /// doc.define_list(target, AttributeDef::new("build_steps"))?;
    /// doc.with_list(target, "build_steps", |list, store| list.push(store, step))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_list<R>(
        &self,
        owner: ObjectId,
        attr: &str,
        f: impl FnOnce(&mut ObjectList, &ObjectStore) -> Result<R>,
    ) -> Result<R> {
        let mut lists = self.lists.write();
        let list = lists.get_mut(&(owner, attr.to_string())).ok_or_else(|| {
            Error::NotFound(format!("relationship `{attr}` on owner {owner}"))
        })?;
        f(list, &self.store)
    }

    /// Member identifiers of one relationship, in membership order.
    pub fn identifiers(&self, owner: ObjectId, attr: &str) -> Result<Vec<ObjectId>> {
        self.read_list(owner, attr, |list| list.identifiers())
    }

    /// Snapshot copy of one relationship's members.
    pub fn members(&self, owner: ObjectId, attr: &str) -> Result<Vec<ListEntry>> {
        self.read_list(owner, attr, |list| list.materialize())
    }

    fn read_list<R>(
        &self,
        owner: ObjectId,
        attr: &str,
        f: impl FnOnce(&ObjectList) -> R,
    ) -> Result<R> {
        let lists = self.lists.read();
        let list = lists.get(&(owner, attr.to_string())).ok_or_else(|| {
            Error::NotFound(format!("relationship `{attr}` on owner {owner}"))
        })?;
        Ok(f(list))
    }

    // ========================================================================
    // Single-valued references
    // ========================================================================

    /// Point `owner.key` at `target`, registering the referrer occurrence.
    /// Replacing an existing reference deregisters the previous target.
    pub fn set_reference(&self, owner: ObjectId, key: &str, target: ObjectId) -> Result<()> {
        if !self.store.contains(owner) {
            return Err(Error::NotFound(format!("object {owner}")));
        }
        if !self.store.contains(target) {
            return Err(Error::NotFound(format!("object {target}")));
        }
        let previous = self.store.get_property(owner, key);
        self.store.add_referrer(target, owner)?;
        if let Some(Value::Ref(old)) = previous {
            self.store.remove_referrer(old, owner)?;
        }
        self.store.set_raw_property(owner, key, Value::Ref(target))
    }

    /// Drop `owner.key`, deregistering the target. Absent keys are a no-op.
    pub fn clear_reference(&self, owner: ObjectId, key: &str) -> Result<Option<ObjectId>> {
        match self.store.get_property(owner, key) {
            None => Ok(None),
            Some(Value::Ref(target)) => {
                self.store.remove_referrer(target, owner)?;
                self.store.remove_property(owner, key)?;
                Ok(Some(target))
            }
            Some(other) => Err(Error::ConstraintViolation(format!(
                "property `{key}` on object {owner} is {}, not a reference",
                other.type_name()
            ))),
        }
    }

    // ========================================================================
    // Reachability
    // ========================================================================

    /// Objects transitively reachable from the roots, following list
    /// membership and single-valued references.
    pub fn reachable(&self) -> HashSet<ObjectId> {
        let lists = self.lists.read();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut frontier: Vec<ObjectId> = self
            .roots
            .read()
            .iter()
            .copied()
            .filter(|id| self.store.contains(*id))
            .collect();

        while let Some(id) = frontier.pop() {
            if !seen.insert(id) {
                continue;
            }
            for target in self.store.references_of(id) {
                if !seen.contains(&target) {
                    frontier.push(target);
                }
            }
            for ((owner, _), list) in lists.iter() {
                if *owner != id {
                    continue;
                }
                for member in list.identifiers() {
                    if !seen.contains(&member) {
                        frontier.push(member);
                    }
                }
            }
        }
        seen
    }

    /// Remove every unreachable object. Their relationships and references
    /// are cleared first, so each survivor's referrer multiset still matches
    /// its actual membership. Returns the removed ids, ascending.
    pub fn prune(&self) -> Result<Vec<ObjectId>> {
        let reachable = self.reachable();
        let doomed: Vec<ObjectId> = self
            .store
            .ids()
            .into_iter()
            .filter(|id| !reachable.contains(id))
            .collect();

        self.detach_owned_edges(&doomed)?;
        for id in &doomed {
            self.store.remove(*id)?;
        }
        debug!(removed = doomed.len(), "pruned unreachable objects");
        Ok(doomed)
    }

    /// Clear the lists and references owned by each of `owners`, balancing
    /// every referrer occurrence they hold on other objects.
    fn detach_owned_edges(&self, owners: &[ObjectId]) -> Result<()> {
        let mut lists = self.lists.write();
        for owner in owners {
            let keys: Vec<(ObjectId, String)> = lists
                .keys()
                .filter(|(o, _)| o == owner)
                .cloned()
                .collect();
            for key in keys {
                if let Some(mut list) = lists.remove(&key) {
                    list.clear(&self.store)?;
                }
            }
            for target in self.store.references_of(*owner) {
                self.store.remove_referrer(target, *owner)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Recompute what every object's referrer multiset should be from actual
    /// list membership and references, and compare with what is recorded.
    pub fn verify_integrity(&self) -> Result<()> {
        let lists = self.lists.read();
        let mut expected: HashMap<ObjectId, Vec<ObjectId>> = HashMap::new();

        for ((owner, _), list) in lists.iter() {
            for member in list.identifiers() {
                expected.entry(member).or_default().push(*owner);
            }
        }
        for id in self.store.ids() {
            for target in self.store.references_of(id) {
                expected.entry(target).or_default().push(id);
            }
        }

        for id in self.store.ids() {
            let mut want = expected.remove(&id).unwrap_or_default();
            let mut have = self.store.referrers(id);
            want.sort();
            have.sort();
            if want != have {
                return Err(Error::ConstraintViolation(format!(
                    "object {id}: recorded referrers {have:?} do not match membership {want:?}"
                )));
            }
        }
        // Whatever remains points at ids the store no longer holds.
        if let Some((id, owners)) = expected.iter().next() {
            return Err(Error::ConstraintViolation(format!(
                "missing object {id} is still referenced by {owners:?}"
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    /// Serializable projection of the reachable subgraph. Referrer state is
    /// bookkeeping, not document content, and is excluded.
    pub fn snapshot(&self) -> DocumentSnapshot {
        let reachable = self.reachable();
        let lists = self.lists.read();

        let mut ids: Vec<ObjectId> = reachable.iter().copied().collect();
        ids.sort();

        let objects = ids
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(|object| {
                let mut object_lists: Vec<ListSnapshot> = lists
                    .iter()
                    .filter(|((owner, _), _)| *owner == object.id)
                    .map(|((_, attr), list)| ListSnapshot {
                        attribute: attr.clone(),
                        entries: list.materialize(),
                    })
                    .collect();
                object_lists.sort_by(|a, b| a.attribute.cmp(&b.attribute));
                ObjectSnapshot {
                    id: object.id,
                    kind: object.kind,
                    properties: object.properties,
                    lists: object_lists,
                }
            })
            .collect::<Vec<_>>();

        debug!(objects = objects.len(), "captured document snapshot");
        DocumentSnapshot {
            roots: self.roots(),
            objects,
        }
    }
}

// ============================================================================
// Snapshot DTOs
// ============================================================================

/// Reachable-only projection of a document, stable across serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub roots: Vec<ObjectId>,
    /// Reachable objects, ascending by id.
    pub objects: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub kind: String,
    pub properties: PropertyMap,
    /// This object's relationships, ascending by attribute name.
    pub lists: Vec<ListSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSnapshot {
    pub attribute: String,
    pub entries: Vec<ListEntry>,
}

// ============================================================================
// Tests
// ============================================================================

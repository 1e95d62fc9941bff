//! Ordered relationship container.
//!
//! An `ObjectList` is the ordered, many-valued relationship between one
//! owner object and one attribute (e.g. a target's `"build_steps"`). It is
//! the only structural mutation path for list membership: every insert,
//! removal, and reorder goes through two private primitives —
//! *register* (validate + add referrer + physical insert) and
//! *deregister* (remove referrer + physical remove) — so membership and
//! referrer counts cannot diverge, whatever operation is added on top.
//!
//! Reordering is compositional remove-then-insert built from those same
//! primitives. There is no in-place swap path: one would have to repeat the
//! referrer pairing by hand, and a missed pair there is exactly the class of
//! bug this container exists to rule out.
//!
//! Duplicates are permitted; the same member may occupy several positions,
//! and each position holds its own referrer occurrence. Order is meaningful:
//! index 0 is the first element downstream consumers act on.

use crate::model::{AttributeDef, ListEntry, ObjectId};
use crate::store::ObjectStore;
use crate::{Error, Result};

// ============================================================================
// ObjectList
// ============================================================================

/// Ordered sequence of members, owned by exactly one (owner, attribute) pair
/// for the lifetime of the owner.
#[derive(Debug, Clone)]
pub struct ObjectList {
    owner: ObjectId,
    attribute: AttributeDef,
    entries: Vec<ListEntry>,
}

impl ObjectList {
    /// Create an empty container for `owner`'s `attribute` relationship.
    pub fn new(owner: ObjectId, attribute: AttributeDef) -> Self {
        Self {
            owner,
            attribute,
            entries: Vec::new(),
        }
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn attribute(&self) -> &AttributeDef {
        &self.attribute
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Add one value at the end.
    pub fn push(&mut self, store: &ObjectStore, value: impl Into<ListEntry>) -> Result<()> {
        self.attribute.check_capacity(self.entries.len(), 1)?;
        self.register_at(store, self.entries.len(), value.into())
    }

    /// Add values at the end, preserving their relative order.
    ///
    /// Every value is validated before the first one is inserted, so a
    /// mid-batch failure leaves the container untouched.
    pub fn append<I>(&mut self, store: &ObjectStore, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<ListEntry>,
    {
        let entries: Vec<ListEntry> = values.into_iter().map(Into::into).collect();
        for entry in &entries {
            self.validate(store, entry)?;
        }
        self.attribute.check_capacity(self.entries.len(), entries.len())?;
        for entry in entries {
            self.register_at(store, self.entries.len(), entry)?;
        }
        Ok(())
    }

    /// Insert at position 0, shifting existing members right.
    pub fn prepend(&mut self, store: &ObjectStore, value: impl Into<ListEntry>) -> Result<()> {
        self.insert_at(store, 0, value)
    }

    /// Insert at `index`, where `0 <= index <= len`; `index == len` appends.
    pub fn insert_at(
        &mut self,
        store: &ObjectStore,
        index: usize,
        value: impl Into<ListEntry>,
    ) -> Result<()> {
        if index > self.entries.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.attribute.check_capacity(self.entries.len(), 1)?;
        self.register_at(store, index, value.into())
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove the first occurrence equal to `value`.
    ///
    /// Absence is a normal outcome (`Ok(None)`), not an error; the container
    /// is unchanged in that case.
    pub fn remove(&mut self, store: &ObjectStore, value: &ListEntry) -> Result<Option<ListEntry>> {
        match self.index_of(value) {
            Some(index) => self.deregister_at(store, index).map(Some),
            None => Ok(None),
        }
    }

    /// Remove the member at `index`; `0 <= index < len`.
    pub fn remove_at(&mut self, store: &ObjectStore, index: usize) -> Result<ListEntry> {
        if index >= self.entries.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.deregister_at(store, index)
    }

    /// Remove every member, front to back, one referrer deregistration per
    /// occurrence.
    pub fn clear(&mut self, store: &ObjectStore) -> Result<()> {
        while !self.entries.is_empty() {
            self.deregister_at(store, 0)?;
        }
        Ok(())
    }

    // ========================================================================
    // Reordering
    // ========================================================================

    /// Move the first occurrence of `value` to `new_index`.
    ///
    /// Fails with `NotPresent` if `value` is not a member and `OutOfRange`
    /// if `new_index` is not a valid final position; both are checked before
    /// any mutation, so a failed move leaves the container unchanged.
    pub fn move_to(
        &mut self,
        store: &ObjectStore,
        value: &ListEntry,
        new_index: usize,
    ) -> Result<()> {
        let old_index = self.index_of(value).ok_or_else(|| {
            Error::NotPresent(format!(
                "{} is not a member of `{}` on owner {}",
                describe(value),
                self.attribute.name(),
                self.owner
            ))
        })?;
        self.relocate(store, old_index, new_index)
    }

    /// Move the member at `old_index` to `new_index`.
    pub fn move_from(
        &mut self,
        store: &ObjectStore,
        old_index: usize,
        new_index: usize,
    ) -> Result<()> {
        if old_index >= self.entries.len() {
            return Err(Error::OutOfRange {
                index: old_index,
                len: self.entries.len(),
            });
        }
        self.relocate(store, old_index, new_index)
    }

    /// Remove-then-insert pair shared by both move forms. Always performed,
    /// even when source and destination coincide.
    fn relocate(&mut self, store: &ObjectStore, old_index: usize, new_index: usize) -> Result<()> {
        if new_index >= self.entries.len() {
            return Err(Error::OutOfRange {
                index: new_index,
                len: self.entries.len(),
            });
        }
        let entry = self.deregister_at(store, old_index)?;
        // The entry was a member moments ago, so re-registration cannot fail
        // validation under this container's exclusive-access contract.
        self.register_at(store, new_index, entry)
    }

    // ========================================================================
    // Read-only projections
    // ========================================================================

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: &ListEntry) -> bool {
        self.entries.contains(value)
    }

    /// Index of the first occurrence equal to `value`.
    pub fn index_of(&self, value: &ListEntry) -> Option<usize> {
        self.entries.iter().position(|e| e == value)
    }

    pub fn get(&self, index: usize) -> Option<&ListEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListEntry> {
        self.entries.iter()
    }

    /// Identifiers of the identity-bearing members, in membership order.
    /// Inline dictionaries have no identifier and are skipped.
    pub fn identifiers(&self) -> Vec<ObjectId> {
        self.entries.iter().filter_map(ListEntry::object_id).collect()
    }

    /// Snapshot copy of the sequence. The caller may mutate the returned
    /// vector freely without affecting the container.
    pub fn materialize(&self) -> Vec<ListEntry> {
        self.entries.clone()
    }

    // ========================================================================
    // Bookkeeping primitives — the only paths that touch membership
    // ========================================================================

    /// Validate + add referrer + physical insert.
    fn register_at(&mut self, store: &ObjectStore, index: usize, entry: ListEntry) -> Result<()> {
        self.validate(store, &entry)?;
        if let Some(id) = entry.object_id() {
            store.add_referrer(id, self.owner)?;
        }
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Remove referrer + physical remove.
    fn deregister_at(&mut self, store: &ObjectStore, index: usize) -> Result<ListEntry> {
        if let Some(id) = self.entries[index].object_id() {
            store.remove_referrer(id, self.owner)?;
        }
        Ok(self.entries.remove(index))
    }

    /// Kind validation for identity-bearing members; inline dictionaries are
    /// exempt but must stay reference-free.
    fn validate(&self, store: &ObjectStore, entry: &ListEntry) -> Result<()> {
        match entry {
            ListEntry::Object(id) => {
                let kind = store
                    .kind_of(*id)
                    .ok_or_else(|| Error::NotFound(format!("member object {id}")))?;
                self.attribute.validate_kind(&kind)
            }
            ListEntry::Dict(map) => {
                if map.values().any(|v| v.contains_ref()) {
                    return Err(Error::ConstraintViolation(format!(
                        "inline dictionary in `{}` holds an object reference",
                        self.attribute.name()
                    )));
                }
                Ok(())
            }
        }
    }
}

fn describe(entry: &ListEntry) -> String {
    match entry {
        ListEntry::Object(id) => format!("object {id}"),
        ListEntry::Dict(_) => "inline dictionary".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

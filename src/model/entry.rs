//! List entry — the value kind stored in an ordered relationship.

use serde::{Deserialize, Serialize};

use super::{ObjectId, PropertyMap};

/// One slot of an ordered relationship container.
///
/// Closed over the two value kinds a relationship can hold:
/// - `Object` — an identity-bearing member, kind-validated on insertion and
///   tracked in the member's referrer multiset.
/// - `Dict` — an inline dictionary with no independent identity; exempt from
///   kind validation and never referrer-tracked. Must not contain object
///   references (references are only valid where bookkeeping can see them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", content = "value")]
pub enum ListEntry {
    Object(ObjectId),
    Dict(PropertyMap),
}

impl ListEntry {
    /// The member's identifier, if it has one. Inline dictionaries don't.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            ListEntry::Object(id) => Some(*id),
            ListEntry::Dict(_) => None,
        }
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, ListEntry::Dict(_))
    }
}

impl From<ObjectId> for ListEntry {
    fn from(id: ObjectId) -> Self {
        ListEntry::Object(id)
    }
}

impl From<PropertyMap> for ListEntry {
    fn from(map: PropertyMap) -> Self {
        ListEntry::Dict(map)
    }
}

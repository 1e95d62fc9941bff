//! Relationship definition — the named, typed attribute a container
//! instantiates for one owner (e.g. `"children"`, `"build_steps"`).

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Declares what an ordered relationship may hold.
///
/// `allowed_kinds` is the set of object kinds the relationship accepts; an
/// empty set accepts everything. `max_members` caps the member count.
/// Inline dictionary entries bypass kind validation entirely (they carry no
/// identity to validate), but still count toward `max_members`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    name: String,
    allowed_kinds: Vec<String>,
    max_members: Option<usize>,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_kinds: Vec::new(),
            max_members: None,
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_members(mut self, max: usize) -> Self {
        self.max_members = Some(max);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_kinds(&self) -> &[String] {
        &self.allowed_kinds
    }

    /// Check a member kind against the declared kind set.
    pub fn validate_kind(&self, kind: &str) -> Result<()> {
        if self.allowed_kinds.is_empty() || self.allowed_kinds.iter().any(|k| k == kind) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                attribute: self.name.clone(),
                expected: self.allowed_kinds.join(" | "),
                got: kind.to_string(),
            })
        }
    }

    /// Check that growing a container of `current` members by `adding` stays
    /// within the declared arity.
    pub fn check_capacity(&self, current: usize, adding: usize) -> Result<()> {
        match self.max_members {
            Some(limit) if current + adding > limit => Err(Error::ArityViolation {
                attribute: self.name.clone(),
                limit,
            }),
            _ => Ok(()),
        }
    }
}

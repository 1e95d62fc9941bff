//! # projgraph — In-Memory Object Graph for Project Documents
//!
//! A project document (IDE-project-file style) is a graph of
//! uniquely-identified objects connected by ordered, many-valued
//! relationships and single-valued references. This crate keeps that graph
//! structurally sound while it is mutated in memory:
//!
//! 1. **Single mutation funnel**: every structural change goes through the
//!    ordered relationship container (`ObjectList`) or the document's
//!    reference API — there is no raw indexable path that bypasses them.
//! 2. **Balanced referrers**: each object records which owners currently
//!    reference it, one occurrence per membership slot. Registrations and
//!    deregistrations are paired inside the mutation funnel.
//! 3. **Reachability-gated output**: serialization sees only the objects
//!    transitively reachable from the document roots.
//!
//! ## Quick Start
//!
//! ```rust
//! use projgraph::{AttributeDef, Document, PropertyMap};
//!
//! # fn example() -> projgraph::Result<()> {
//! let doc = Document::new();
//! let project = doc.create_object("Project", PropertyMap::new());
//! let compile = doc.create_object("BuildStep", PropertyMap::new());
//! let link = doc.create_object("BuildStep", PropertyMap::new());
//! doc.add_root(project)?;
//!
//! doc.define_list(project, AttributeDef::new("build_steps").with_kinds(["BuildStep"]))?;
//! doc.with_list(project, "build_steps", |list, store| {
//!     list.append(store, [compile, link])
//! })?;
//!
//! // Reorder: link first. Compositional remove-then-insert keeps the
//! // referrer bookkeeping balanced.
//! doc.with_list(project, "build_steps", |list, store| {
//!     list.move_to(store, &link.into(), 0)
//! })?;
//!
//! assert_eq!(doc.identifiers(project, "build_steps")?, vec![link, compile]);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod document;
pub mod export;
pub mod list;
pub mod model;
pub mod store;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{AttributeDef, ListEntry, Object, ObjectId, PropertyMap, Value};

// ============================================================================
// Re-exports: Core container and store
// ============================================================================

pub use list::ObjectList;
pub use store::ObjectStore;

// ============================================================================
// Re-exports: Document
// ============================================================================

pub use document::{Document, DocumentSnapshot, ListSnapshot, ObjectSnapshot};
pub use export::{export_json, export_json_string};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("type mismatch on `{attribute}`: expected {expected}, got {got}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        got: String,
    },

    #[error("arity violation on `{attribute}`: at most {limit} member(s) allowed")]
    ArityViolation { attribute: String, limit: usize },

    #[error("not present: {0}")]
    NotPresent(String),

    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

//! JSON export — serialize the reachable subgraph of a document.
//!
//! Produces a stable JSON rendering of a `DocumentSnapshot`. The snapshot is
//! already reachability-gated, so anything the roots do not reach never
//! appears in the output.
//!
//! ```text
//! Document → snapshot() → export_json() → JSON
//!   → diffable, re-parseable with serde into DocumentSnapshot
//! ```

use std::io::Write;

use crate::document::Document;
use crate::Result;

/// Write a document's reachable subgraph as pretty-printed JSON.
pub fn export_json(document: &Document, writer: &mut dyn Write) -> Result<()> {
    let snapshot = document.snapshot();
    serde_json::to_writer_pretty(&mut *writer, &snapshot)?;
    writeln!(writer)?;
    Ok(())
}

/// As [`export_json`], returning the JSON as a string.
pub fn export_json_string(document: &Document) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&document.snapshot())?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeDef, PropertyMap, Value};

    #[test]
    fn test_export_contains_only_reachable_objects() {
        let doc = Document::new();
        let project = doc.create_object("Project", PropertyMap::new());
        let target = doc.create_object("Target", PropertyMap::new());
        let orphan = doc.create_object("FileRef", PropertyMap::new());
        doc.add_root(project).unwrap();

        doc.define_list(project, AttributeDef::new("targets")).unwrap();
        doc.with_list(project, "targets", |list, store| list.push(store, target))
            .unwrap();
        doc.store()
            .set_property(orphan, "path", Value::from("stale.c"))
            .unwrap();

        let json = export_json_string(&doc).unwrap();
        assert!(json.contains("\"Target\""));
        assert!(!json.contains("stale.c"));
    }
}

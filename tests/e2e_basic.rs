//! End-to-end tests for building and editing a project document.
//!
//! Each test exercises the full stack: document → relationship container →
//! object store, asserting both the visible ordering and the referrer
//! bookkeeping underneath.

use projgraph::{AttributeDef, Document, ListEntry, PropertyMap, Value};

fn named(props: &mut PropertyMap, name: &str) {
    props.insert("name".into(), Value::from(name));
}

// ============================================================================
// 1. Build a small project and read it back in order
// ============================================================================

#[test]
fn test_build_project_and_read_in_order() {
    let doc = Document::new();
    let project = doc.create_object("Project", PropertyMap::new());
    doc.add_root(project).unwrap();

    let mut props = PropertyMap::new();
    named(&mut props, "compile");
    let compile = doc.create_object("BuildStep", props);

    let mut props = PropertyMap::new();
    named(&mut props, "link");
    let link = doc.create_object("BuildStep", props);

    let mut props = PropertyMap::new();
    named(&mut props, "sign");
    let sign = doc.create_object("BuildStep", props);

    doc.define_list(project, AttributeDef::new("build_steps").with_kinds(["BuildStep"]))
        .unwrap();
    doc.with_list(project, "build_steps", |list, store| {
        list.append(store, [compile, link, sign])
    })
    .unwrap();

    assert_eq!(
        doc.identifiers(project, "build_steps").unwrap(),
        vec![compile, link, sign]
    );
    for id in [compile, link, sign] {
        assert_eq!(doc.store().referrer_count(id, project), 1);
    }
}

// ============================================================================
// 2. Prepend and insert-at position exactly as requested
// ============================================================================

#[test]
fn test_prepend_and_insert_positions() {
    let doc = Document::new();
    let target = doc.create_object("Target", PropertyMap::new());
    doc.define_list(target, AttributeDef::new("build_steps")).unwrap();

    let a = doc.create_object("BuildStep", PropertyMap::new());
    let b = doc.create_object("BuildStep", PropertyMap::new());
    let first = doc.create_object("BuildStep", PropertyMap::new());
    let mid = doc.create_object("BuildStep", PropertyMap::new());

    doc.with_list(target, "build_steps", |list, store| {
        list.append(store, [a, b])?;
        list.prepend(store, first)?;
        list.insert_at(store, 2, mid)
    })
    .unwrap();

    assert_eq!(
        doc.identifiers(target, "build_steps").unwrap(),
        vec![first, a, mid, b]
    );
}

// ============================================================================
// 3. A member shared by two owners survives removal from one
// ============================================================================

#[test]
fn test_shared_member_survives_removal_from_one_owner() {
    let doc = Document::new();
    let debug_target = doc.create_object("Target", PropertyMap::new());
    let release_target = doc.create_object("Target", PropertyMap::new());
    let shared = doc.create_object("BuildStep", PropertyMap::new());

    doc.define_list(debug_target, AttributeDef::new("build_steps")).unwrap();
    doc.define_list(release_target, AttributeDef::new("build_steps")).unwrap();

    doc.with_list(debug_target, "build_steps", |list, store| list.push(store, shared))
        .unwrap();
    doc.with_list(release_target, "build_steps", |list, store| list.push(store, shared))
        .unwrap();

    let removed = doc
        .with_list(debug_target, "build_steps", |list, store| {
            list.remove(store, &shared.into())
        })
        .unwrap();
    assert_eq!(removed, Some(ListEntry::Object(shared)));

    // Still a member elsewhere, still referenced, still removable-protected.
    assert_eq!(doc.identifiers(release_target, "build_steps").unwrap(), vec![shared]);
    assert_eq!(doc.store().referrer_count(shared, release_target), 1);
    assert_eq!(doc.store().referrer_count(shared, debug_target), 0);
    assert!(doc.store().remove(shared).is_err());
}

// ============================================================================
// 4. Reordering via both move forms
// ============================================================================

#[test]
fn test_reorder_build_steps() {
    let doc = Document::new();
    let target = doc.create_object("Target", PropertyMap::new());
    doc.define_list(target, AttributeDef::new("build_steps")).unwrap();

    let a = doc.create_object("BuildStep", PropertyMap::new());
    let b = doc.create_object("BuildStep", PropertyMap::new());
    let c = doc.create_object("BuildStep", PropertyMap::new());

    doc.with_list(target, "build_steps", |list, store| list.append(store, [a, b, c]))
        .unwrap();

    doc.with_list(target, "build_steps", |list, store| list.move_to(store, &c.into(), 0))
        .unwrap();
    assert_eq!(doc.identifiers(target, "build_steps").unwrap(), vec![c, a, b]);

    doc.with_list(target, "build_steps", |list, store| list.move_from(store, 0, 2))
        .unwrap();
    assert_eq!(doc.identifiers(target, "build_steps").unwrap(), vec![a, b, c]);

    // One occurrence, one referrer record, through any number of moves.
    for id in [a, b, c] {
        assert_eq!(doc.store().referrer_count(id, target), 1);
    }
    doc.verify_integrity().unwrap();
}

// ============================================================================
// 5. Inline dictionaries sit between identity-bearing members
// ============================================================================

#[test]
fn test_inline_dictionaries_mix_with_objects() {
    let doc = Document::new();
    let target = doc.create_object("Target", PropertyMap::new());
    doc.define_list(target, AttributeDef::new("build_steps").with_kinds(["BuildStep"]))
        .unwrap();

    let step = doc.create_object("BuildStep", PropertyMap::new());
    let mut flags = PropertyMap::new();
    flags.insert("warnings_as_errors".into(), Value::from(true));

    doc.with_list(target, "build_steps", |list, store| {
        list.push(store, step)?;
        list.push(store, flags.clone())
    })
    .unwrap();

    // Dictionaries count as members but carry no identity.
    let members = doc.members(target, "build_steps").unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(doc.identifiers(target, "build_steps").unwrap(), vec![step]);
    assert_eq!(members[1], ListEntry::Dict(flags));
}

// ============================================================================
// 6. Materialized copies are detached from the container
// ============================================================================

#[test]
fn test_materialize_is_a_snapshot() {
    let doc = Document::new();
    let target = doc.create_object("Target", PropertyMap::new());
    doc.define_list(target, AttributeDef::new("build_steps")).unwrap();

    let a = doc.create_object("BuildStep", PropertyMap::new());
    doc.with_list(target, "build_steps", |list, store| list.push(store, a))
        .unwrap();

    let mut copy = doc.members(target, "build_steps").unwrap();
    copy.clear();
    copy.push(ListEntry::Object(a));
    copy.push(ListEntry::Object(a));

    assert_eq!(doc.identifiers(target, "build_steps").unwrap(), vec![a]);
    assert_eq!(doc.store().referrer_count(a, target), 1);
}

// ============================================================================
// 7. Single-valued references play by the same bookkeeping rules
// ============================================================================

#[test]
fn test_references_and_lists_share_bookkeeping() {
    let doc = Document::new();
    let project = doc.create_object("Project", PropertyMap::new());
    let config = doc.create_object("Config", PropertyMap::new());
    let target = doc.create_object("Target", PropertyMap::new());

    doc.set_reference(project, "active_config", config).unwrap();
    doc.define_list(project, AttributeDef::new("targets")).unwrap();
    doc.with_list(project, "targets", |list, store| list.push(store, target))
        .unwrap();

    assert_eq!(doc.store().referrer_count(config, project), 1);
    assert_eq!(doc.store().referrer_count(target, project), 1);
    doc.verify_integrity().unwrap();
}

//! End-to-end mirroring of the sample document through a session.

use treemirror::core::NodeKind;
use treemirror::sync::structural_digest;
use treemirror::{ConvergenceResult, MirrorSession, SessionConfig};
use treemirror_testkit::{init_tracing, SampleDocument};

fn start(doc: &mut SampleDocument) -> MirrorSession {
    init_tracing();
    let root = doc.root();
    MirrorSession::start(&mut doc.tree, root, SessionConfig::default()).unwrap()
}

fn assert_converged(session: &MirrorSession, doc: &SampleDocument) {
    match session.verify(&doc.tree) {
        ConvergenceResult::Converged { .. } => {}
        ConvergenceResult::Diverged { path, reason } => {
            panic!("diverged at {path:?}: {reason}")
        }
    }
}

#[test]
fn snapshot_mirrors_whole_document() {
    let mut doc = SampleDocument::new().unwrap();
    let session = start(&mut doc);

    assert_converged(&session, &doc);
    assert_eq!(session.mirror().id_count(), 13);
    assert_eq!(
        structural_digest(&doc.tree, doc.root()),
        structural_digest(session.mirror().tree(), session.mirror().root())
    );
}

#[test]
fn appends_inserts_and_removals() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    doc.push_item("three").unwrap();
    let first = doc.tree.create_element("LI").unwrap();
    doc.tree
        .insert_before(doc.list, first, Some(doc.items[0]))
        .unwrap();
    doc.tree.detach(doc.comment).unwrap();

    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);
}

#[test]
fn reorder_siblings_in_one_batch() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);
    doc.push_item("three").unwrap();
    session.flush(&mut doc.tree).unwrap();

    // Reverse the list.
    let items = doc.tree.children(doc.list).to_vec();
    for item in items.iter().rev() {
        doc.tree.append_child(doc.list, *item).unwrap();
    }

    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);
}

#[test]
fn move_subtree_across_parents() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    doc.tree.append_child(doc.head, doc.list).unwrap();
    doc.tree
        .set_attribute(doc.items[1], "class", "moved")
        .unwrap();

    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);

    // The list keeps its id: one back-reference plus anchors, nothing resent.
    let list_id = session.client().serializer().registry().get(doc.list).unwrap();
    let changes = session.last_changes().unwrap();
    assert!(changes.removed.is_empty());
    assert_eq!(changes.added_or_moved.len(), 1);
    assert_eq!(changes.added_or_moved[0].id, list_id);
    assert!(changes.added_or_moved[0].without_anchors().is_reference());
    assert_eq!(session.mirror().id_count(), 13);
}

#[test]
fn removed_subtree_ids_are_released_on_both_sides() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);
    for i in 0..50 {
        doc.push_item(&format!("item {i}")).unwrap();
    }
    session.flush(&mut doc.tree).unwrap();
    assert_eq!(session.mirror().id_count(), 113);

    doc.tree.detach(doc.list).unwrap();
    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);

    let known = session.client().serializer().registry().len();
    assert_eq!(known, 8);
    assert_eq!(session.mirror().id_count(), known);
}

#[test]
fn large_subtree_move_is_a_single_reference() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);
    for i in 0..50 {
        doc.push_item(&format!("item {i}")).unwrap();
    }
    session.flush(&mut doc.tree).unwrap();

    doc.tree.append_child(doc.head, doc.list).unwrap();
    session.flush(&mut doc.tree).unwrap();
    assert_converged(&session, &doc);

    let changes = session.last_changes().unwrap();
    assert_eq!(changes.record_count(), 1);
    assert!(changes.added_or_moved[0].without_anchors().is_reference());
    assert_eq!(
        session.mirror().id_count(),
        session.client().serializer().registry().len()
    );
}

#[test]
fn changes_made_while_detached_are_carried() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    doc.tree.detach(doc.list).unwrap();
    session.flush(&mut doc.tree).unwrap();

    doc.tree
        .set_character_data(doc.item_texts[0], "edited offline")
        .unwrap();
    doc.tree.set_attribute(doc.items[1], "id", "second").unwrap();
    session.flush(&mut doc.tree);

    doc.tree.append_child(doc.body, doc.list).unwrap();
    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);
}

#[test]
fn attribute_and_text_updates() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    doc.tree.set_attribute(doc.html, "lang", "en").unwrap();
    doc.tree.remove_attribute(doc.body, "class").unwrap();
    doc.tree
        .set_character_data(doc.title_text, "Renamed")
        .unwrap();
    doc.tree.set_character_data(doc.comment, "edited").unwrap();

    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);

    let mirror = session.mirror().tree();
    let html = mirror
        .children(session.mirror().root())
        .iter()
        .copied()
        .find(|n| matches!(mirror.kind(*n), Some(NodeKind::Element { .. })))
        .unwrap();
    assert_eq!(mirror.attribute(html, "lang"), Some("en"));
}

#[test]
fn add_then_remove_in_one_batch_is_suppressed() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    let item = doc.push_item("temporary").unwrap();
    doc.tree.detach(item).unwrap();

    assert!(session.flush(&mut doc.tree).is_none());
    assert_converged(&session, &doc);
}

#[test]
fn set_text_content_replaces_children() {
    let mut doc = SampleDocument::new().unwrap();
    let mut session = start(&mut doc);

    doc.tree.set_text_content(doc.list, "flattened").unwrap();

    let report = session.flush(&mut doc.tree).unwrap();
    assert!(report.is_clean());
    assert_converged(&session, &doc);
}

#[test]
fn observing_an_element_mirrors_its_children_only() {
    init_tracing();
    let mut doc = SampleDocument::new().unwrap();
    let mut session =
        MirrorSession::start(&mut doc.tree, doc.body, SessionConfig::default()).unwrap();

    doc.tree.set_attribute(doc.html, "lang", "en").unwrap();
    assert!(session.flush(&mut doc.tree).is_none());

    doc.push_item("three").unwrap();
    assert!(session.flush(&mut doc.tree).is_some());
    assert!(session.verify(&doc.tree).is_converged());
}

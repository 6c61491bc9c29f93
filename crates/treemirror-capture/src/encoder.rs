//! Batch encoder: turns a [`ChangeSummary`] into a [`ChangeMessage`].
//!
//! Added and moved nodes are encoded as *runs*: for every parent, contiguous
//! changed siblings are emitted left to right, each carrying its previous
//! sibling and its parent as anchors. The receiver then rebuilds exact order
//! from one anchor per node.
//!
//! Anchors are serialized before the node they anchor, parent first. A parent
//! that is itself new is therefore sent as a full subtree before any of its
//! children are referenced, so the receiver can always resolve every
//! back-reference in the record it is applying.

use std::collections::{HashMap, HashSet};

use treemirror_core::{AttributeMap, ChangeMessage, NodeRef, SerializedNode, Tree};

use crate::serializer::TreeSerializer;
use crate::summary::ChangeSummary;

/// Encode one summary.
///
/// A removed node that is attached under the observed root again by encode
/// time was moved: it keeps its id and is placed by back-reference. Every
/// other removed node is listed in `rem`, and its id and the ids of
/// everything still below it are released before the placements are built.
/// Changes made to a subtree while it was detached are observed until the
/// batch is taken, so a moved subtree's earlier records stay valid.
pub fn encode(
    serializer: &mut TreeSerializer,
    tree: &Tree,
    summary: &ChangeSummary,
) -> ChangeMessage {
    let detached = detached_nodes(serializer, tree, summary);
    let removed = detached
        .iter()
        .filter_map(|node| serializer.reference(*node))
        .collect();
    for node in &detached {
        forget_subtree(serializer, tree, *node);
    }

    let message = ChangeMessage {
        removed,
        added_or_moved: encode_added_or_moved(serializer, tree, summary),
        attributes: encode_attributes(serializer, tree, summary),
        text: encode_text(serializer, tree, summary),
    };

    tracing::trace!(
        removed = message.removed.len(),
        added_or_moved = message.added_or_moved.len(),
        attributes = message.attributes.len(),
        text = message.text.len(),
        "encoded batch"
    );
    message
}

/// Removed nodes that are no longer under the observed root, deduplicated
/// in removal order.
fn detached_nodes(
    serializer: &TreeSerializer,
    tree: &Tree,
    summary: &ChangeSummary,
) -> Vec<NodeRef> {
    let mut seen = HashSet::new();
    summary
        .removed
        .iter()
        .copied()
        .filter(|node| seen.insert(*node))
        .filter(|node| !tree.is_inclusive_ancestor(serializer.root(), *node))
        .collect()
}

fn forget_subtree(serializer: &mut TreeSerializer, tree: &Tree, node: NodeRef) {
    let mut stack = vec![node];
    while let Some(next) = stack.pop() {
        serializer.forget(next);
        stack.extend_from_slice(tree.children(next));
    }
}

fn encode_added_or_moved(
    serializer: &mut TreeSerializer,
    tree: &Tree,
    summary: &ChangeSummary,
) -> Vec<SerializedNode> {
    let changed = summary
        .added
        .iter()
        .chain(&summary.reparented)
        .chain(&summary.reordered);

    // Group by current parent, keeping first-seen order of parents and nodes.
    let mut groups: Vec<(NodeRef, Vec<NodeRef>)> = Vec::new();
    let mut group_index: HashMap<NodeRef, usize> = HashMap::new();
    let mut seen = HashSet::new();
    for node in changed {
        let Some(parent) = tree.parent(*node) else {
            continue;
        };
        if !seen.insert(*node) {
            continue;
        }
        let index = *group_index.entry(parent).or_insert_with(|| {
            groups.push((parent, Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push(*node);
    }

    let mut records = Vec::new();
    for (parent, members) in groups {
        let mut pending: HashSet<NodeRef> = members.iter().copied().collect();

        for start in members {
            if !pending.contains(&start) {
                continue;
            }

            // Leftmost node of the contiguous run containing `start`.
            let mut first = start;
            while let Some(prev) = tree.previous_sibling(first) {
                if !pending.contains(&prev) {
                    break;
                }
                first = prev;
            }

            let mut cursor = Some(first);
            while let Some(node) = cursor.filter(|n| pending.contains(n)) {
                pending.remove(&node);
                if let Some(record) = encode_placement(serializer, tree, parent, node) {
                    records.push(record);
                }
                cursor = tree.next_sibling(node);
            }
        }
    }
    records
}

fn encode_placement(
    serializer: &mut TreeSerializer,
    tree: &Tree,
    parent: NodeRef,
    node: NodeRef,
) -> Option<SerializedNode> {
    let parent_node = serializer.serialize_node(tree, Some(parent), true)?;
    let previous_sibling = serializer.serialize_node(tree, tree.previous_sibling(node), true);
    let mut record = serializer.serialize_node(tree, Some(node), true)?;
    record.previous_sibling = previous_sibling.map(Box::new);
    record.parent_node = Some(Box::new(parent_node));
    Some(record)
}

/// One record per element, carrying every attribute changed in the batch
/// with its value at encode time (`None` when it no longer exists).
fn encode_attributes(
    serializer: &mut TreeSerializer,
    tree: &Tree,
    summary: &ChangeSummary,
) -> Vec<SerializedNode> {
    let mut records: Vec<SerializedNode> = Vec::new();
    let mut index: HashMap<NodeRef, usize> = HashMap::new();

    for (name, elements) in &summary.attribute_changed {
        for element in elements {
            let slot = match index.get(element) {
                Some(slot) => *slot,
                None => {
                    let Some(mut record) = serializer.serialize_node(tree, Some(*element), false)
                    else {
                        continue;
                    };
                    record.attributes = Some(AttributeMap::new());
                    records.push(record);
                    index.insert(*element, records.len() - 1);
                    records.len() - 1
                }
            };
            if let Some(attributes) = records[slot].attributes.as_mut() {
                let value = tree.attribute(*element, name).map(str::to_string);
                attributes.insert(name.clone(), value);
            }
        }
    }
    records
}

fn encode_text(
    serializer: &mut TreeSerializer,
    tree: &Tree,
    summary: &ChangeSummary,
) -> Vec<SerializedNode> {
    let mut seen = HashSet::new();
    summary
        .character_data_changed
        .iter()
        .filter(|node| seen.insert(**node))
        .filter_map(|node| {
            let mut record = serializer.serialize_node(tree, Some(*node), false)?;
            record.text_content = serializer.text_of(tree, *node);
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::CaptureConfig;
    use crate::summary::summarize;
    use treemirror_core::{NodeId, NodeType};

    struct Fixture {
        tree: Tree,
        serializer: TreeSerializer,
    }

    impl Fixture {
        fn new(build: impl FnOnce(&mut Tree)) -> Self {
            let mut tree = Tree::new();
            build(&mut tree);
            let mut serializer = TreeSerializer::new(tree.root(), CaptureConfig::default());
            serializer.snapshot(&tree);
            tree.observe(tree.root()).unwrap();
            Self { tree, serializer }
        }

        fn flush(&mut self) -> ChangeMessage {
            let summary = summarize(&self.tree.take_records());
            encode(&mut self.serializer, &self.tree, &summary)
        }

        fn id(&self, node: NodeRef) -> NodeId {
            self.serializer.registry().get(node).unwrap()
        }
    }

    fn elements(tree: &mut Tree, tags: &[&str]) -> Vec<NodeRef> {
        tags.iter().map(|t| tree.create_element(t).unwrap()).collect()
    }

    #[test]
    fn test_empty_summary_encodes_empty_message() {
        let mut fx = Fixture::new(|_| {});
        assert!(fx.flush().is_empty());
    }

    #[test]
    fn test_appended_run_anchors_each_node() {
        let mut fx = Fixture::new(|_| {});
        let root = fx.tree.root();
        let nodes = elements(&mut fx.tree, &["a", "b", "c"]);
        for node in &nodes {
            fx.tree.append_child(root, *node).unwrap();
        }

        let msg = fx.flush();
        assert_eq!(msg.added_or_moved.len(), 3);

        let first = &msg.added_or_moved[0];
        assert_eq!(first.tag_name.as_deref(), Some("a"));
        assert!(first.previous_sibling.is_none());
        assert_eq!(first.parent_node.as_deref(), Some(&SerializedNode::reference(NodeId(1))));

        let second = &msg.added_or_moved[1];
        assert_eq!(second.tag_name.as_deref(), Some("b"));
        assert_eq!(second.previous_sibling.as_ref().unwrap().id, first.id);
    }

    #[test]
    fn test_run_starts_at_leftmost_changed_sibling() {
        let mut fx = Fixture::new(|_| {});
        let root = fx.tree.root();
        let nodes = elements(&mut fx.tree, &["a", "b", "c"]);
        // Insert out of document order: c, then a, then b between them.
        fx.tree.append_child(root, nodes[2]).unwrap();
        fx.tree.insert_before(root, nodes[0], Some(nodes[2])).unwrap();
        fx.tree.insert_before(root, nodes[1], Some(nodes[2])).unwrap();

        let msg = fx.flush();
        let tags: Vec<_> = msg
            .added_or_moved
            .iter()
            .map(|r| r.tag_name.clone().unwrap())
            .collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_keeps_id_and_places_by_reference() {
        let mut p = None;
        let mut q = None;
        let mut b = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let nodes = elements(tree, &["p", "q", "a", "b", "c", "z"]);
            tree.append_child(root, nodes[0]).unwrap();
            tree.append_child(root, nodes[1]).unwrap();
            for child in &nodes[2..5] {
                tree.append_child(nodes[0], *child).unwrap();
            }
            tree.append_child(nodes[1], nodes[5]).unwrap();
            p = Some(nodes[0]);
            q = Some(nodes[1]);
            b = Some(nodes[3]);
        });
        let (p, q, b) = (p.unwrap(), q.unwrap(), b.unwrap());
        let b_id = fx.id(b);
        let first_of_q = fx.tree.first_child(q);
        fx.tree.insert_before(q, b, first_of_q).unwrap();

        let msg = fx.flush();
        assert!(msg.removed.is_empty());
        assert_eq!(msg.added_or_moved.len(), 1);
        let placed = &msg.added_or_moved[0];
        assert!(placed.previous_sibling.is_none());
        assert_eq!(placed.parent_node.as_ref().unwrap().id, fx.id(q));
        assert_ne!(placed.parent_node.as_ref().unwrap().id, fx.id(p));

        assert!(placed.without_anchors().is_reference());
        assert_eq!(placed.id, b_id);
        assert_eq!(fx.id(b), b_id);
    }

    #[test]
    fn test_subtree_moved_within_batch_sends_one_reference() {
        let mut list = None;
        let mut head = None;
        let mut first_item = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let h = tree.create_element("head").unwrap();
            let ul = tree.create_element("ul").unwrap();
            tree.append_child(root, h).unwrap();
            tree.append_child(root, ul).unwrap();
            for i in 0..50 {
                let li = tree.create_element("li").unwrap();
                let label = tree.create_text(&format!("item {i}"));
                tree.append_child(li, label).unwrap();
                tree.append_child(ul, li).unwrap();
                first_item.get_or_insert(li);
            }
            list = Some(ul);
            head = Some(h);
        });
        let (list, head, first_item) = (list.unwrap(), head.unwrap(), first_item.unwrap());
        let root = fx.tree.root();
        let known = fx.serializer.registry().len();

        fx.tree.remove_child(root, list).unwrap();
        fx.tree.set_attribute(first_item, "class", "while-detached").unwrap();
        fx.tree.append_child(head, list).unwrap();

        let msg = fx.flush();
        assert!(msg.removed.is_empty());
        assert_eq!(msg.added_or_moved.len(), 1);
        let placed = &msg.added_or_moved[0];
        assert!(placed.without_anchors().is_reference());
        assert_eq!(placed.id, fx.id(list));
        assert_eq!(placed.parent_node.as_ref().unwrap().id, fx.id(head));

        assert_eq!(msg.attributes.len(), 1);
        assert_eq!(msg.attributes[0].id, fx.id(first_item));
        assert_eq!(fx.serializer.registry().len(), known);
    }

    #[test]
    fn test_removal_releases_every_descendant_id() {
        let mut list = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let ul = tree.create_element("ul").unwrap();
            tree.append_child(root, ul).unwrap();
            for _ in 0..3 {
                let li = tree.create_element("li").unwrap();
                let label = tree.create_text("x");
                tree.append_child(li, label).unwrap();
                tree.append_child(ul, li).unwrap();
            }
            list = Some(ul);
        });
        let list = list.unwrap();
        let root = fx.tree.root();
        let list_id = fx.id(list);
        assert_eq!(fx.serializer.registry().len(), 8);

        fx.tree.remove_child(root, list).unwrap();
        let msg = fx.flush();
        assert_eq!(msg.removed, vec![SerializedNode::reference(list_id)]);
        assert_eq!(fx.serializer.registry().len(), 1);
    }

    #[test]
    fn test_long_sibling_list_runs_anchor_to_real_siblings() {
        let mut parent = None;
        let mut children = Vec::new();
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let div = tree.create_element("div").unwrap();
            tree.append_child(root, div).unwrap();
            for _ in 0..300 {
                let span = tree.create_element("span").unwrap();
                tree.append_child(div, span).unwrap();
                children.push(span);
            }
            parent = Some(div);
        });
        let parent = parent.unwrap();

        // Every third sibling gets a new neighbour, giving a hundred runs.
        let mut anchors = Vec::new();
        for anchor in children.iter().step_by(3) {
            let fresh = fx.tree.create_element("b").unwrap();
            let next = fx.tree.next_sibling(*anchor);
            fx.tree.insert_before(parent, fresh, next).unwrap();
            anchors.push(*anchor);
        }

        let msg = fx.flush();
        assert_eq!(msg.added_or_moved.len(), 100);
        for (record, anchor) in msg.added_or_moved.iter().zip(&anchors) {
            assert_eq!(record.tag_name.as_deref(), Some("b"));
            assert_eq!(record.previous_sibling.as_ref().unwrap().id, fx.id(*anchor));
            assert_eq!(record.parent_node.as_ref().unwrap().id, fx.id(parent));
        }
    }

    #[test]
    fn test_new_subtree_sent_once_in_full() {
        let mut fx = Fixture::new(|_| {});
        let root = fx.tree.root();
        let div = fx.tree.create_element("div").unwrap();
        let span = fx.tree.create_element("span").unwrap();
        let text = fx.tree.create_text("hi");
        fx.tree.append_child(span, text).unwrap();
        fx.tree.append_child(div, span).unwrap();
        fx.tree.append_child(root, div).unwrap();

        let msg = fx.flush();
        assert_eq!(msg.added_or_moved.len(), 1);
        let record = &msg.added_or_moved[0];
        let span_record = &record.child_nodes.as_ref().unwrap()[0];
        assert_eq!(span_record.tag_name.as_deref(), Some("span"));
        let text_record = &span_record.child_nodes.as_ref().unwrap()[0];
        assert_eq!(text_record.node_type, Some(NodeType::Text));
    }

    #[test]
    fn test_new_parent_is_sent_before_its_children() {
        let mut fx = Fixture::new(|_| {});
        let root = fx.tree.root();
        let div = fx.tree.create_element("div").unwrap();
        fx.tree.append_child(root, div).unwrap();
        let span = fx.tree.create_element("span").unwrap();
        fx.tree.append_child(div, span).unwrap();

        let msg = fx.flush();
        // div's record carries span inside it; span's own record is a reference.
        let div_record = &msg.added_or_moved[0];
        assert_eq!(div_record.tag_name.as_deref(), Some("div"));
        let nested = &div_record.child_nodes.as_ref().unwrap()[0];
        assert_eq!(nested.tag_name.as_deref(), Some("span"));

        let span_record = &msg.added_or_moved[1];
        assert!(span_record.without_anchors().is_reference());
        assert_eq!(span_record.parent_node.as_ref().unwrap().id, div_record.id);
    }

    #[test]
    fn test_attribute_changes_aggregate_per_element() {
        let mut div = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let node = tree.create_element("div").unwrap();
            tree.append_child(root, node).unwrap();
            tree.set_attribute(node, "class", "old").unwrap();
            div = Some(node);
        });
        let div = div.unwrap();
        fx.tree.set_attribute(div, "class", "mid").unwrap();
        fx.tree.set_attribute(div, "class", "new").unwrap();
        fx.tree.set_attribute(div, "title", "t").unwrap();
        fx.tree.set_attribute(div, "title", "u").unwrap();
        fx.tree.remove_attribute(div, "title").unwrap();

        let msg = fx.flush();
        assert_eq!(msg.attributes.len(), 1);
        let attributes = msg.attributes[0].attributes.as_ref().unwrap();
        assert_eq!(attributes.get("class"), Some(&Some("new".to_string())));
        assert_eq!(attributes.get("title"), Some(&None));
    }

    #[test]
    fn test_text_change_deduplicated() {
        let mut text = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let node = tree.create_text("a");
            tree.append_child(root, node).unwrap();
            text = Some(node);
        });
        let text = text.unwrap();
        fx.tree.set_character_data(text, "b").unwrap();
        fx.tree.set_character_data(text, "c").unwrap();

        let msg = fx.flush();
        assert_eq!(msg.text.len(), 1);
        assert_eq!(msg.text[0].text_content.as_deref(), Some("c"));
    }

    #[test]
    fn test_subtree_reinserted_in_later_batch_is_sent_fresh() {
        let mut div = None;
        let mut span = None;
        let mut fx = Fixture::new(|tree| {
            let root = tree.root();
            let d = tree.create_element("div").unwrap();
            let s = tree.create_element("span").unwrap();
            tree.append_child(d, s).unwrap();
            tree.append_child(root, d).unwrap();
            div = Some(d);
            span = Some(s);
        });
        let (div, span) = (div.unwrap(), span.unwrap());
        let root = fx.tree.root();
        let old_span = fx.id(span);

        fx.tree.remove_child(root, div).unwrap();
        fx.flush();
        assert!(fx.serializer.registry().get(span).is_none());

        // Unobserved while detached.
        fx.tree.set_attribute(span, "class", "late").unwrap();
        fx.tree.append_child(root, div).unwrap();

        let msg = fx.flush();
        let record = &msg.added_or_moved[0];
        let span_record = &record.child_nodes.as_ref().unwrap()[0];
        assert!(span_record.id > old_span);
        let attributes = span_record.attributes.as_ref().unwrap();
        assert_eq!(attributes.get("class"), Some(&Some("late".to_string())));
    }

    #[test]
    fn test_added_then_removed_in_same_batch_is_dropped() {
        let mut fx = Fixture::new(|_| {});
        let root = fx.tree.root();
        let div = fx.tree.create_element("div").unwrap();
        fx.tree.append_child(root, div).unwrap();
        fx.tree.remove_child(root, div).unwrap();

        let msg = fx.flush();
        assert!(msg.is_empty());
        assert!(fx.serializer.registry().get(div).is_none());
    }
}

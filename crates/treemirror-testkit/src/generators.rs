//! Proptest generators for property-based testing.
//!
//! Trees are generated as [`NodeSpec`] values and built with [`build`].
//! Mutations pick their targets by index into the current subtree, so any
//! generated [`Mutation`] can be applied to any tree.

use proptest::prelude::*;

use treemirror_core::{NodeKind, NodeRef, Tree, TreeError};

/// Shape of a generated subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<NodeSpec>,
    },
    Text(String),
    Comment(String),
}

/// Generate an element tag name.
pub fn tag_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["DIV", "SPAN", "P", "UL", "LI", "A", "SECTION"])
        .prop_map(String::from)
}

/// Generate an attribute name.
pub fn attribute_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["id", "class", "title", "href", "data-x"]).prop_map(String::from)
}

/// Generate an attribute value.
pub fn attribute_value() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,8}".prop_map(String::from)
}

/// Generate character data.
pub fn text_data() -> impl Strategy<Value = String> {
    "[a-z ]{0,12}".prop_map(String::from)
}

/// Generate a set of distinct attributes.
pub fn attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(attribute_name(), attribute_value(), 0..3)
        .prop_map(|map| map.into_iter().collect())
}

/// Generate a subtree up to four levels deep.
pub fn node_spec() -> impl Strategy<Value = NodeSpec> {
    let leaf = prop_oneof![
        3 => text_data().prop_map(NodeSpec::Text),
        1 => text_data().prop_map(NodeSpec::Comment),
        2 => (tag_name(), attributes()).prop_map(|(tag, attributes)| NodeSpec::Element {
            tag,
            attributes,
            children: Vec::new(),
        }),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (tag_name(), attributes(), prop::collection::vec(inner, 0..4)).prop_map(
            |(tag, attributes, children)| NodeSpec::Element {
                tag,
                attributes,
                children,
            },
        )
    })
}

/// Generate the children of a document.
pub fn document_spec() -> impl Strategy<Value = Vec<NodeSpec>> {
    prop::collection::vec(node_spec(), 0..4)
}

/// Create the nodes for `spec`, detached.
pub fn create(tree: &mut Tree, spec: &NodeSpec) -> Result<NodeRef, TreeError> {
    match spec {
        NodeSpec::Text(data) => Ok(tree.create_text(data)),
        NodeSpec::Comment(data) => Ok(tree.create_comment(data)),
        NodeSpec::Element {
            tag,
            attributes,
            children,
        } => {
            let element = tree.create_element(tag)?;
            for (name, value) in attributes {
                tree.set_attribute(element, name, value)?;
            }
            for child in children {
                let node = create(tree, child)?;
                tree.append_child(element, node)?;
            }
            Ok(element)
        }
    }
}

/// Build `specs` as the trailing children of `parent`.
pub fn build(tree: &mut Tree, parent: NodeRef, specs: &[NodeSpec]) -> Result<(), TreeError> {
    for spec in specs {
        let node = create(tree, spec)?;
        tree.append_child(parent, node)?;
    }
    Ok(())
}

/// A tree mutation. Indices wrap around the candidates present when the
/// mutation is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert {
        parent: usize,
        position: usize,
        node: NodeSpec,
    },
    Remove {
        node: usize,
    },
    Move {
        node: usize,
        parent: usize,
        position: usize,
    },
    SetAttribute {
        node: usize,
        name: String,
        value: String,
    },
    RemoveAttribute {
        node: usize,
        name: String,
    },
    SetText {
        node: usize,
        text: String,
    },
}

/// Generate a single mutation.
pub fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        3 => (any::<usize>(), any::<usize>(), node_spec()).prop_map(|(parent, position, node)| {
            Mutation::Insert { parent, position, node }
        }),
        2 => any::<usize>().prop_map(|node| Mutation::Remove { node }),
        3 => (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(
            |(node, parent, position)| Mutation::Move { node, parent, position }
        ),
        2 => (any::<usize>(), attribute_name(), attribute_value()).prop_map(
            |(node, name, value)| Mutation::SetAttribute { node, name, value }
        ),
        1 => (any::<usize>(), attribute_name())
            .prop_map(|(node, name)| Mutation::RemoveAttribute { node, name }),
        2 => (any::<usize>(), text_data()).prop_map(|(node, text)| Mutation::SetText { node, text }),
    ]
}

/// Generate up to `max` batches of up to `per_batch` mutations each.
pub fn batches(max: usize, per_batch: usize) -> impl Strategy<Value = Vec<Vec<Mutation>>> {
    prop::collection::vec(prop::collection::vec(mutation(), 0..=per_batch), 0..=max)
}

/// `root` and its descendants in document order.
pub fn subtree(tree: &Tree, root: NodeRef) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(tree.children(node).iter().rev());
    }
    out
}

/// Apply `mutation` inside the subtree rooted at `root`.
///
/// Returns `Ok(false)` when the tree has no candidate for the mutation.
pub fn apply_mutation(
    tree: &mut Tree,
    root: NodeRef,
    mutation: &Mutation,
) -> Result<bool, TreeError> {
    let nodes = subtree(tree, root);
    let descendants = &nodes[1..];

    match mutation {
        Mutation::Insert {
            parent,
            position,
            node,
        } => {
            let containers = containers(tree, &nodes, None);
            let parent = pick(&containers, *parent);
            let reference = position_in(tree, parent, *position);
            let created = create(tree, node)?;
            tree.insert_before(parent, created, reference)?;
            Ok(true)
        }
        Mutation::Remove { node } => {
            if descendants.is_empty() {
                return Ok(false);
            }
            tree.detach(pick(descendants, *node))?;
            Ok(true)
        }
        Mutation::Move {
            node,
            parent,
            position,
        } => {
            if descendants.is_empty() {
                return Ok(false);
            }
            let node = pick(descendants, *node);
            let targets = containers(tree, &nodes, Some(node));
            let parent = pick(&targets, *parent);
            let reference = position_in(tree, parent, *position);
            tree.insert_before(parent, node, reference)?;
            Ok(true)
        }
        Mutation::SetAttribute { node, name, value } => {
            let elements = elements(tree, descendants);
            if elements.is_empty() {
                return Ok(false);
            }
            tree.set_attribute(pick(&elements, *node), name, value)?;
            Ok(true)
        }
        Mutation::RemoveAttribute { node, name } => {
            let elements = elements(tree, descendants);
            if elements.is_empty() {
                return Ok(false);
            }
            tree.remove_attribute(pick(&elements, *node), name)?;
            Ok(true)
        }
        Mutation::SetText { node, text } => {
            let data: Vec<NodeRef> = descendants
                .iter()
                .copied()
                .filter(|n| matches!(tree.kind(*n), Some(NodeKind::Text(_) | NodeKind::Comment(_))))
                .collect();
            if data.is_empty() {
                return Ok(false);
            }
            tree.set_character_data(pick(&data, *node), text)?;
            Ok(true)
        }
    }
}

fn pick(candidates: &[NodeRef], index: usize) -> NodeRef {
    candidates[index % candidates.len()]
}

/// Containers among `nodes`, excluding the subtree of `moving`.
fn containers(tree: &Tree, nodes: &[NodeRef], moving: Option<NodeRef>) -> Vec<NodeRef> {
    nodes
        .iter()
        .copied()
        .filter(|n| tree.kind(*n).is_some_and(NodeKind::is_container))
        .filter(|n| moving.map_or(true, |m| !tree.is_inclusive_ancestor(m, *n)))
        .collect()
}

fn elements(tree: &Tree, nodes: &[NodeRef]) -> Vec<NodeRef> {
    nodes
        .iter()
        .copied()
        .filter(|n| matches!(tree.kind(*n), Some(NodeKind::Element { .. })))
        .collect()
}

fn position_in(tree: &Tree, parent: NodeRef, position: usize) -> Option<NodeRef> {
    let children = tree.children(parent);
    children.get(position % (children.len() + 1)).copied()
}

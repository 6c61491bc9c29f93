//! Convergence verification between a source tree and its mirror.
//!
//! Two subtrees have converged when their contents are structurally
//! identical: same node kinds in the same order, same tag names, same
//! attribute sets (order ignored), same character data. Node identity and
//! arena positions play no part.

use std::collections::BTreeMap;
use std::fmt;

use treemirror_core::{NodeKind, NodeRef, Tree};

const DIGEST_DOMAIN: &[u8] = b"treemirror-structure-v0:";

/// BLAKE3 digest of a subtree's structure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructuralDigest(pub [u8; 32]);

impl StructuralDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for StructuralDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructuralDigest({})", self.to_hex())
    }
}

impl fmt::Display for StructuralDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest of the subtree rooted at `node`, the node itself included.
pub fn structural_digest(tree: &Tree, node: NodeRef) -> StructuralDigest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);
    hash_node(tree, node, &mut hasher);
    StructuralDigest(*hasher.finalize().as_bytes())
}

/// Digest of the children of `node`.
///
/// The container itself is left out, so an element observed at the source
/// and the document it is mirrored into compare equal.
pub fn content_digest(tree: &Tree, node: NodeRef) -> StructuralDigest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);
    hash_children(tree, node, &mut hasher);
    StructuralDigest(*hasher.finalize().as_bytes())
}

fn hash_node(tree: &Tree, node: NodeRef, hasher: &mut blake3::Hasher) {
    let Some(kind) = tree.kind(node) else {
        hasher.update(&[0, 0]);
        return;
    };
    hasher.update(&u16::from(kind.node_type()).to_le_bytes());

    match kind {
        NodeKind::Document => {}
        NodeKind::Element {
            tag_name,
            attributes,
        } => {
            hash_str(hasher, tag_name);
            let sorted: BTreeMap<&str, &str> = attributes
                .iter()
                .map(|a| (a.name.as_str(), a.value.as_str()))
                .collect();
            hash_len(hasher, sorted.len());
            for (name, value) in sorted {
                hash_str(hasher, name);
                hash_str(hasher, value);
            }
        }
        NodeKind::Text(data) | NodeKind::Comment(data) => hash_str(hasher, data),
        NodeKind::DocumentType {
            name,
            public_id,
            system_id,
        } => {
            hash_str(hasher, name);
            hash_str(hasher, public_id);
            hash_str(hasher, system_id);
        }
    }

    hash_children(tree, node, hasher);
}

fn hash_children(tree: &Tree, node: NodeRef, hasher: &mut blake3::Hasher) {
    let children = tree.children(node);
    hash_len(hasher, children.len());
    for child in children {
        hash_node(tree, *child, hasher);
    }
}

fn hash_len(hasher: &mut blake3::Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hash_len(hasher, s.len());
    hasher.update(s.as_bytes());
}

/// Result of convergence verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Both subtrees have identical contents.
    Converged { digest: StructuralDigest },
    /// First difference in document order. `path` holds child indices from
    /// the compared containers down to the diverging node.
    Diverged { path: Vec<usize>, reason: String },
}

impl ConvergenceResult {
    /// Check if the trees have converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceResult::Converged { .. })
    }
}

/// Compare the contents of `source_root` with those of `mirror_root`.
pub fn verify_convergence(
    source: &Tree,
    source_root: NodeRef,
    mirror: &Tree,
    mirror_root: NodeRef,
) -> ConvergenceResult {
    let mut path = Vec::new();
    match compare_children(source, source_root, mirror, mirror_root, &mut path) {
        Some(reason) => ConvergenceResult::Diverged { path, reason },
        None => ConvergenceResult::Converged {
            digest: content_digest(source, source_root),
        },
    }
}

fn compare_children(
    source: &Tree,
    source_node: NodeRef,
    mirror: &Tree,
    mirror_node: NodeRef,
    path: &mut Vec<usize>,
) -> Option<String> {
    let source_children = source.children(source_node);
    let mirror_children = mirror.children(mirror_node);

    for (index, (s, m)) in source_children.iter().zip(mirror_children).enumerate() {
        path.push(index);
        if let Some(reason) = compare_node(source, *s, mirror, *m, path) {
            return Some(reason);
        }
        path.pop();
    }

    if source_children.len() != mirror_children.len() {
        return Some(format!(
            "child count mismatch: source={}, mirror={}",
            source_children.len(),
            mirror_children.len()
        ));
    }
    None
}

fn compare_node(
    source: &Tree,
    source_node: NodeRef,
    mirror: &Tree,
    mirror_node: NodeRef,
    path: &mut Vec<usize>,
) -> Option<String> {
    let (Some(s), Some(m)) = (source.kind(source_node), mirror.kind(mirror_node)) else {
        return Some("node missing from arena".to_string());
    };

    match (s, m) {
        (
            NodeKind::Element {
                tag_name: s_tag,
                attributes: s_attrs,
            },
            NodeKind::Element {
                tag_name: m_tag,
                attributes: m_attrs,
            },
        ) => {
            if s_tag != m_tag {
                return Some(format!("tag mismatch: source={s_tag}, mirror={m_tag}"));
            }
            let s_map: BTreeMap<&str, &str> = s_attrs
                .iter()
                .map(|a| (a.name.as_str(), a.value.as_str()))
                .collect();
            let m_map: BTreeMap<&str, &str> = m_attrs
                .iter()
                .map(|a| (a.name.as_str(), a.value.as_str()))
                .collect();
            if s_map != m_map {
                return Some(format!(
                    "attribute mismatch on {s_tag}: source={s_map:?}, mirror={m_map:?}"
                ));
            }
        }
        (NodeKind::Text(s_data), NodeKind::Text(m_data))
        | (NodeKind::Comment(s_data), NodeKind::Comment(m_data)) => {
            if s_data != m_data {
                return Some(format!(
                    "character data mismatch: source={s_data:?}, mirror={m_data:?}"
                ));
            }
        }
        (
            NodeKind::DocumentType {
                name: s_name,
                public_id: s_public,
                system_id: s_system,
            },
            NodeKind::DocumentType {
                name: m_name,
                public_id: m_public,
                system_id: m_system,
            },
        ) => {
            if (s_name, s_public, s_system) != (m_name, m_public, m_system) {
                return Some(format!("doctype mismatch: source={s_name}, mirror={m_name}"));
            }
        }
        (NodeKind::Document, NodeKind::Document) => {}
        _ => {
            return Some(format!(
                "node type mismatch: source={:?}, mirror={:?}",
                s.node_type(),
                m.node_type()
            ));
        }
    }

    compare_children(source, source_node, mirror, mirror_node, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(attrs: &[(&str, &str)], text: &str) -> (Tree, NodeRef) {
        let mut tree = Tree::new();
        let root = tree.root();
        let div = tree.create_element("DIV").unwrap();
        for (name, value) in attrs {
            tree.set_attribute(div, name, value).unwrap();
        }
        let t = tree.create_text(text);
        tree.append_child(div, t).unwrap();
        tree.append_child(root, div).unwrap();
        (tree, root)
    }

    #[test]
    fn test_identical_trees_converge() {
        let (a, a_root) = build(&[("id", "x")], "hi");
        let (b, b_root) = build(&[("id", "x")], "hi");

        let result = verify_convergence(&a, a_root, &b, b_root);
        assert!(result.is_converged());
        assert_eq!(content_digest(&a, a_root), content_digest(&b, b_root));
    }

    #[test]
    fn test_attribute_order_is_ignored() {
        let (a, a_root) = build(&[("id", "x"), ("class", "y")], "hi");
        let (b, b_root) = build(&[("class", "y"), ("id", "x")], "hi");

        assert!(verify_convergence(&a, a_root, &b, b_root).is_converged());
        assert_eq!(structural_digest(&a, a_root), structural_digest(&b, b_root));
    }

    #[test]
    fn test_text_divergence_reports_path() {
        let (a, a_root) = build(&[], "hi");
        let (b, b_root) = build(&[], "ho");

        match verify_convergence(&a, a_root, &b, b_root) {
            ConvergenceResult::Diverged { path, reason } => {
                assert_eq!(path, vec![0, 0]);
                assert!(reason.contains("character data"));
            }
            other => panic!("expected divergence, got {other:?}"),
        }
        assert_ne!(content_digest(&a, a_root), content_digest(&b, b_root));
    }

    #[test]
    fn test_child_count_and_type_mismatch() {
        let (a, a_root) = build(&[], "hi");
        let (mut b, b_root) = build(&[], "hi");
        let extra = b.create_comment("extra");
        b.append_child(b_root, extra).unwrap();

        match verify_convergence(&a, a_root, &b, b_root) {
            ConvergenceResult::Diverged { path, reason } => {
                assert!(path.is_empty());
                assert!(reason.contains("child count"));
            }
            other => panic!("expected divergence, got {other:?}"),
        }

        let mut c = Tree::new();
        let c_root = c.root();
        let comment = c.create_comment("hi");
        c.append_child(c_root, comment).unwrap();
        let result = verify_convergence(&a, a_root, &c, c_root);
        assert!(matches!(result, ConvergenceResult::Diverged { ref path, .. } if path == &[0]));
    }

    #[test]
    fn test_content_digest_ignores_container_kind() {
        let (a, a_root) = build(&[], "hi");

        let mut b = Tree::new();
        let host = b.create_element("SECTION").unwrap();
        let div = b.create_element("DIV").unwrap();
        let t = b.create_text("hi");
        b.append_child(div, t).unwrap();
        b.append_child(host, div).unwrap();

        assert_eq!(content_digest(&a, a_root), content_digest(&b, host));
        assert_ne!(structural_digest(&a, a_root), structural_digest(&b, host));
        assert_eq!(content_digest(&a, a_root).to_hex().len(), 64);
    }
}

//! Mirror applier: rebuilds a tree from a snapshot and replays change batches.
//!
//! A batch is applied in six passes: resolve and detach every placed node,
//! detach removed nodes, insert placed nodes after their anchors, write
//! attributes, write text, and finally drop the ids of every removed subtree.
//! Detaching everything
//! first means no insertion can ever try to put a node under its own
//! descendant, whatever order the moves happened in at the source.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use treemirror_core::{
    decode_escapes, ChangeMessage, InitializeMessage, MirrorMessage, MirrorSink, NodeId, NodeRef,
    NodeType, SerializedNode, Tree,
};

use crate::delegate::{Interception, MirrorDelegate, NoDelegate};
use crate::error::{MirrorError, Result};

/// Configuration for the mirror side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Decode percent escapes in incoming text and comment content.
    pub decode_text_escapes: bool,
}

/// Where in the application a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyStage {
    /// A snapshot arriving after the mirror was already seeded.
    Initialize,
    /// Resolving or constructing the record's node or one of its anchors.
    Construct,
    /// A nested child of a first-seen node.
    Child,
    Detach,
    Insert,
    Attribute,
    Text,
}

impl fmt::Display for ApplyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyStage::Initialize => "initialize",
            ApplyStage::Construct => "construct",
            ApplyStage::Child => "child",
            ApplyStage::Detach => "detach",
            ApplyStage::Insert => "insert",
            ApplyStage::Attribute => "attribute",
            ApplyStage::Text => "text",
        };
        f.write_str(name)
    }
}

/// One contained failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub id: NodeId,
    pub stage: ApplyStage,
    pub error: MirrorError,
}

/// Outcome of applying one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Top-level records applied without any failure.
    pub applied: usize,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    /// Whether nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures raised at `stage`.
    pub fn failures_at(&self, stage: ApplyStage) -> impl Iterator<Item = &ApplyFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    fn fail(&mut self, id: NodeId, stage: ApplyStage, error: MirrorError) {
        tracing::warn!(%id, %stage, %error, "mirror operation failed");
        self.failures.push(ApplyFailure { id, stage, error });
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    node: NodeRef,
    parent: NodeRef,
    previous: Option<NodeRef>,
}

/// Receiver-side replica of an observed subtree.
#[derive(Debug)]
pub struct TreeMirror<D = NoDelegate> {
    tree: Tree,
    root: NodeRef,
    id_map: HashMap<NodeId, NodeRef>,
    node_ids: HashMap<NodeRef, NodeId>,
    delegate: D,
    config: MirrorConfig,
    initialized: bool,
    last_report: ApplyReport,
}

impl TreeMirror<NoDelegate> {
    /// Mirror into a fresh document with no delegate.
    pub fn new(config: MirrorConfig) -> Self {
        Self::with_delegate(NoDelegate, config)
    }
}

impl Default for TreeMirror<NoDelegate> {
    fn default() -> Self {
        Self::new(MirrorConfig::default())
    }
}

impl<D: MirrorDelegate> TreeMirror<D> {
    /// Mirror into a fresh document.
    pub fn with_delegate(delegate: D, config: MirrorConfig) -> Self {
        let tree = Tree::new();
        let root = tree.root();
        Self::with_tree(tree, root, delegate, config)
    }

    /// Mirror under `root` of an existing tree. The mirror never observes
    /// `tree`, so applying batches produces no feedback.
    pub fn with_tree(tree: Tree, root: NodeRef, delegate: D, config: MirrorConfig) -> Self {
        Self {
            tree,
            root,
            id_map: HashMap::new(),
            node_ids: HashMap::new(),
            delegate,
            config,
            initialized: false,
            last_report: ApplyReport::default(),
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// The mirror node currently registered for `id`.
    pub fn node(&self, id: NodeId) -> Option<NodeRef> {
        self.id_map.get(&id).copied()
    }

    /// Number of ids currently registered.
    pub fn id_count(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    /// Report of the last message applied through [`MirrorSink`].
    pub fn last_report(&self) -> &ApplyReport {
        &self.last_report
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────────

    /// Seed the mirror from a snapshot.
    ///
    /// Returns [`MirrorError::AlreadyInitialized`] on a second call; every
    /// other failure is contained to the child that raised it.
    pub fn initialize(&mut self, message: &InitializeMessage) -> Result<ApplyReport> {
        if self.initialized {
            return Err(MirrorError::AlreadyInitialized);
        }
        self.initialized = true;
        self.register(message.root_id, self.root);

        let mut report = ApplyReport::default();
        let root = self.root;
        for child in &message.children {
            match self.build(child, Some(root), &mut report) {
                Ok(_) => report.applied += 1,
                Err(error) => report.fail(child.id, ApplyStage::Construct, error),
            }
        }

        tracing::debug!(
            root_id = %message.root_id,
            nodes = self.id_map.len(),
            "mirror initialized"
        );
        Ok(report)
    }

    /// Apply one change batch.
    pub fn apply_changed(&mut self, message: &ChangeMessage) -> ApplyReport {
        let mut report = ApplyReport::default();

        // Pull every placed node out of the tree before anything is inserted.
        let mut placements = Vec::with_capacity(message.added_or_moved.len());
        for record in &message.added_or_moved {
            match self.resolve_placement(record, &mut report) {
                Ok(placement) => {
                    if let Err(error) = self.tree.detach(placement.node) {
                        report.fail(record.id, ApplyStage::Detach, error.into());
                    }
                    placements.push((record.id, placement));
                }
                Err(error) => report.fail(record.id, ApplyStage::Construct, error),
            }
        }

        for record in &message.removed {
            match self.detach_known(record.id) {
                Ok(()) => report.applied += 1,
                Err(error) => report.fail(record.id, ApplyStage::Detach, error),
            }
        }

        for (id, placement) in placements {
            match self.insert(placement) {
                Ok(()) => report.applied += 1,
                Err(error) => report.fail(id, ApplyStage::Insert, error),
            }
        }

        for record in &message.attributes {
            if self.apply_attributes(record, &mut report) {
                report.applied += 1;
            }
        }

        for record in &message.text {
            match self.apply_text(record, &mut report) {
                Ok(()) => report.applied += 1,
                Err(error) => report.fail(record.id, ApplyStage::Text, error),
            }
        }

        for record in &message.removed {
            self.release_subtree(record.id);
        }

        tracing::trace!(
            applied = report.applied,
            failed = report.failures.len(),
            "applied batch"
        );
        report
    }

    /// Apply either kind of message.
    pub fn apply(&mut self, message: &MirrorMessage) -> Result<ApplyReport> {
        match message {
            MirrorMessage::Initialize(init) => self.initialize(init),
            MirrorMessage::Change(change) => Ok(self.apply_changed(change)),
        }
    }

    /// Resolve the node for `record`, constructing it when its id is unseen,
    /// and append it under `parent` when given.
    ///
    /// A `{id}` back-reference never constructs anything: an unknown one is
    /// [`MirrorError::UnknownId`]. Failures among `childNodes` are logged and
    /// skipped.
    pub fn deserialize_node(
        &mut self,
        record: &SerializedNode,
        parent: Option<NodeRef>,
    ) -> Result<NodeRef> {
        let mut report = ApplyReport::default();
        self.build(record, parent, &mut report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Passes
    // ─────────────────────────────────────────────────────────────────────────

    /// Parent first, then the previous sibling, then the node: a parent that
    /// is new in this batch arrives in full and carries the node inside it.
    fn resolve_placement(
        &mut self,
        record: &SerializedNode,
        report: &mut ApplyReport,
    ) -> Result<Placement> {
        let parent_record = record
            .parent_node
            .as_deref()
            .ok_or(MirrorError::MissingParent(record.id))?;
        let parent = self.build(parent_record, None, report)?;
        let previous = match record.previous_sibling.as_deref() {
            Some(previous) => Some(self.build(previous, None, report)?),
            None => None,
        };
        let node = self.build(record, None, report)?;
        Ok(Placement {
            node,
            parent,
            previous,
        })
    }

    /// Drop the id of a removed node and of every node still below it. The
    /// sender released all of them together.
    fn release_subtree(&mut self, id: NodeId) {
        let Some(node) = self.id_map.remove(&id) else {
            return;
        };
        self.node_ids.remove(&node);
        let mut stack = self.tree.children(node).to_vec();
        while let Some(next) = stack.pop() {
            if let Some(id) = self.node_ids.remove(&next) {
                self.id_map.remove(&id);
            }
            stack.extend_from_slice(self.tree.children(next));
        }
    }

    fn detach_known(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id).ok_or(MirrorError::UnknownId(id))?;
        self.tree.detach(node)?;
        Ok(())
    }

    fn insert(&mut self, placement: Placement) -> Result<()> {
        let reference = match placement.previous {
            Some(previous) => self.tree.next_sibling(previous),
            None => self.tree.first_child(placement.parent),
        };
        self.tree
            .insert_before(placement.parent, placement.node, reference)?;
        Ok(())
    }

    /// Returns whether every attribute of the record was written.
    fn apply_attributes(&mut self, record: &SerializedNode, report: &mut ApplyReport) -> bool {
        let node = match self.build(record, None, report) {
            Ok(node) => node,
            Err(error) => {
                report.fail(record.id, ApplyStage::Attribute, error);
                return false;
            }
        };
        let Some(attributes) = &record.attributes else {
            return true;
        };

        let mut clean = true;
        for (name, value) in attributes {
            let result = match value {
                None => self
                    .tree
                    .remove_attribute(node, name)
                    .map_err(MirrorError::from),
                Some(value) => self.write_attribute(node, name, value),
            };
            if let Err(error) = result {
                clean = false;
                report.fail(record.id, ApplyStage::Attribute, error);
            }
        }
        clean
    }

    fn apply_text(&mut self, record: &SerializedNode, report: &mut ApplyReport) -> Result<()> {
        let node = self.build(record, None, report)?;
        let text = self.incoming_text(record);
        self.tree.set_text_content(node, &text)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    fn build(
        &mut self,
        record: &SerializedNode,
        parent: Option<NodeRef>,
        report: &mut ApplyReport,
    ) -> Result<NodeRef> {
        if let Some(node) = self.node(record.id) {
            // Known nodes met inside a new subtree move under it.
            if let Some(parent) = parent {
                self.tree.append_child(parent, node)?;
            }
            return Ok(node);
        }
        if record.is_reference() {
            return Err(MirrorError::UnknownId(record.id));
        }

        let node = self.construct(record, report)?;
        self.register(record.id, node);
        if let Some(parent) = parent {
            self.tree.append_child(parent, node)?;
        }

        if let Some(children) = &record.child_nodes {
            for child in children {
                if let Err(error) = self.build(child, Some(node), report) {
                    report.fail(child.id, ApplyStage::Child, error);
                }
            }
        }
        Ok(node)
    }

    fn register(&mut self, id: NodeId, node: NodeRef) {
        self.id_map.insert(id, node);
        self.node_ids.insert(node, id);
    }

    fn construct(&mut self, record: &SerializedNode, report: &mut ApplyReport) -> Result<NodeRef> {
        let node_type = record
            .node_type
            .ok_or(MirrorError::MissingNodeType(record.id))?;

        match node_type {
            NodeType::Text => {
                let text = self.incoming_text(record);
                Ok(self.tree.create_text(&text))
            }
            NodeType::Comment => {
                let text = self.incoming_text(record);
                Ok(self.tree.create_comment(&text))
            }
            NodeType::DocumentType => Ok(self.tree.create_doctype(
                record.name.as_deref().unwrap_or_default(),
                record.public_id.as_deref().unwrap_or_default(),
                record.system_id.as_deref().unwrap_or_default(),
            )),
            NodeType::Element => {
                let tag_name = record
                    .tag_name
                    .as_deref()
                    .ok_or(MirrorError::MissingTagName(record.id))?;
                let element = self.create_element(tag_name, record)?;
                for (name, value) in record.attributes.iter().flatten() {
                    let Some(value) = value else {
                        continue;
                    };
                    if let Err(error) = self.write_attribute(element, name, value) {
                        report.fail(record.id, ApplyStage::Attribute, error);
                    }
                }
                Ok(element)
            }
            NodeType::Document => Err(MirrorError::UnexpectedDocument(record.id)),
        }
    }

    fn create_element(&mut self, tag_name: &str, record: &SerializedNode) -> Result<NodeRef> {
        if let Interception::Handled(node) =
            self.delegate.create_element(&mut self.tree, tag_name, record)
        {
            return Ok(node);
        }
        let node = self
            .tree
            .create_element(&tag_name.replace('<', ""))
            .or_else(|_| self.tree.create_element(tag_name))?;
        Ok(node)
    }

    fn write_attribute(&mut self, node: NodeRef, name: &str, value: &str) -> Result<()> {
        match self.delegate.set_attribute(&mut self.tree, node, name, value) {
            Interception::Handled(()) => Ok(()),
            Interception::FallThrough => Ok(self.tree.set_attribute(node, name, value)?),
        }
    }

    fn incoming_text(&self, record: &SerializedNode) -> String {
        let text = record.text_content.as_deref().unwrap_or_default();
        if self.config.decode_text_escapes {
            decode_escapes(text)
        } else {
            text.to_string()
        }
    }
}

impl<D: MirrorDelegate> MirrorSink for TreeMirror<D> {
    fn initialize(&mut self, message: &InitializeMessage) {
        match TreeMirror::initialize(self, message) {
            Ok(report) => self.last_report = report,
            Err(error) => {
                let mut report = ApplyReport::default();
                report.fail(message.root_id, ApplyStage::Initialize, error);
                self.last_report = report;
            }
        }
    }

    fn apply_changed(&mut self, message: &ChangeMessage) {
        self.last_report = TreeMirror::apply_changed(self, message);
    }
}

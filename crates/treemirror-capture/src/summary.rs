//! Change summarizer: buckets one batch of raw mutation records.
//!
//! The summarizer does no move detection. A node removed from one parent and
//! added to another within the same batch shows up in both `removed` and
//! `added`; `reparented` and `reordered` are part of the summary shape but
//! this pass never fills them.

use std::collections::BTreeMap;

use treemirror_core::{MutationRecord, NodeRef};

/// Structured view of one batch of mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub added: Vec<NodeRef>,
    pub removed: Vec<NodeRef>,
    pub reparented: Vec<NodeRef>,
    pub reordered: Vec<NodeRef>,
    /// Attribute name -> elements whose attribute changed, not deduplicated.
    pub attribute_changed: BTreeMap<String, Vec<NodeRef>>,
    pub character_data_changed: Vec<NodeRef>,
}

impl ChangeSummary {
    /// Whether every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.reparented.is_empty()
            && self.reordered.is_empty()
            && self.attribute_changed.values().all(Vec::is_empty)
            && self.character_data_changed.is_empty()
    }
}

/// Bucket a batch of raw records into a [`ChangeSummary`].
pub fn summarize(records: &[MutationRecord]) -> ChangeSummary {
    let mut summary = ChangeSummary::default();

    for record in records {
        match record {
            MutationRecord::ChildList { added, removed, .. } => {
                summary.added.extend_from_slice(added);
                summary.removed.extend_from_slice(removed);
            }
            MutationRecord::Attributes { target, name, .. } => {
                summary
                    .attribute_changed
                    .entry(name.clone())
                    .or_default()
                    .push(*target);
            }
            MutationRecord::CharacterData { target, .. } => {
                summary.character_data_changed.push(*target);
            }
        }
    }

    summary
}

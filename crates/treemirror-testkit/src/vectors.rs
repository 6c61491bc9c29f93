//! Golden wire vectors.
//!
//! Each vector starts from a fresh [`SampleDocument`], connects a client to
//! its root, applies one batch of mutations and flushes. The expected value
//! is the exact JSON of the last message the client emitted, so these
//! vectors pin field names, field order, omission rules and id allocation.

use thiserror::Error;
use treemirror_capture::{CaptureConfig, CaptureError, TreeMirrorClient};
use treemirror_core::{MirrorMessage, TreeError, WireError};

use crate::fixtures::SampleDocument;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Mutations applied between connect and flush.
    pub mutate: fn(&mut SampleDocument) -> Result<(), TreeError>,
    /// Expected JSON of the last emitted message.
    pub expected: &'static str,
}

/// Error running a vector.
#[derive(Debug, Error)]
pub enum VectorError {
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("vector emitted no message")]
    NoMessage,
}

/// Snapshot of the untouched sample document.
pub const SNAPSHOT_JSON: &str = concat!(
    r#"{"rootId":1,"children":["#,
    r#"{"id":2,"nodeType":10,"name":"html","publicId":"","systemId":""},"#,
    r#"{"id":3,"nodeType":1,"tagName":"HTML","attributes":{},"childNodes":["#,
    r#"{"id":4,"nodeType":1,"tagName":"HEAD","attributes":{},"childNodes":["#,
    r#"{"id":5,"nodeType":1,"tagName":"TITLE","attributes":{},"childNodes":["#,
    r#"{"id":6,"nodeType":3,"textContent":"Sample"}]}]},"#,
    r#"{"id":7,"nodeType":1,"tagName":"BODY","attributes":{"class":"main"},"childNodes":["#,
    r#"{"id":8,"nodeType":1,"tagName":"UL","attributes":{},"childNodes":["#,
    r#"{"id":9,"nodeType":1,"tagName":"LI","attributes":{},"childNodes":["#,
    r#"{"id":10,"nodeType":3,"textContent":"one"}]},"#,
    r#"{"id":11,"nodeType":1,"tagName":"LI","attributes":{},"childNodes":["#,
    r#"{"id":12,"nodeType":3,"textContent":"two"}]}]},"#,
    r#"{"id":13,"nodeType":8,"textContent":" note "}]}]}]}"#,
);

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "snapshot of the sample document",
            mutate: |_| Ok(()),
            expected: SNAPSHOT_JSON,
        },
        GoldenVector {
            name: "appended list item",
            mutate: |doc| doc.push_item("three").map(|_| ()),
            expected: concat!(
                r#"{"adOrMo":[{"id":14,"nodeType":1,"tagName":"LI","attributes":{},"#,
                r#""childNodes":[{"id":15,"nodeType":3,"textContent":"three"}],"#,
                r#""previousSibling":{"id":11},"parentNode":{"id":8}}]}"#,
            ),
        },
        GoldenVector {
            name: "attribute changes on two elements",
            mutate: |doc| {
                doc.tree.set_attribute(doc.body, "class", "alt")?;
                doc.tree.set_attribute(doc.list, "title", "t")?;
                doc.tree.set_attribute(doc.body, "class", "final")
            },
            expected: concat!(
                r#"{"att":[{"id":7,"attributes":{"class":"final"}},"#,
                r#"{"id":8,"attributes":{"title":"t"}}]}"#,
            ),
        },
        GoldenVector {
            name: "removed attribute",
            mutate: |doc| doc.tree.remove_attribute(doc.body, "class"),
            expected: r#"{"att":[{"id":7,"attributes":{"class":null}}]}"#,
        },
        GoldenVector {
            name: "removal plus text change",
            mutate: |doc| {
                doc.tree.detach(doc.items[0])?;
                doc.tree.set_character_data(doc.title_text, "Renamed")
            },
            expected: r#"{"rem":[{"id":9}],"text":[{"id":6,"textContent":"Renamed"}]}"#,
        },
        GoldenVector {
            name: "comment moved to the front of its parent",
            mutate: |doc| {
                doc.tree
                    .insert_before(doc.body, doc.comment, Some(doc.list))
            },
            expected: r#"{"adOrMo":[{"id":13,"parentNode":{"id":7}}]}"#,
        },
    ]
}

/// Run `vector` and return the JSON of the last emitted message.
pub fn run_vector(vector: &GoldenVector) -> Result<String, VectorError> {
    let mut doc = SampleDocument::new()?;
    let root = doc.root();
    let mut sent: Vec<MirrorMessage> = Vec::new();

    let mut client =
        TreeMirrorClient::connect(&mut doc.tree, root, CaptureConfig::default(), &mut sent)?;
    (vector.mutate)(&mut doc)?;
    client.flush(&mut doc.tree, &mut sent);

    let last = sent.last().ok_or(VectorError::NoMessage)?;
    Ok(last.to_json()?)
}

/// Run every vector, returning the names of those whose output differs.
pub fn verify_all_vectors() -> Result<Vec<&'static str>, VectorError> {
    let mut mismatches = Vec::new();
    for vector in all_vectors() {
        if run_vector(&vector)? != vector.expected {
            mismatches.push(vector.name);
        }
    }
    Ok(mismatches)
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use treemirror_core::{NodeRef, Tree, TreeError};

/// A small HTML-like document with a handle for every interesting node.
///
/// ```text
/// #document
/// ├── <!DOCTYPE html>
/// └── HTML
///     ├── HEAD
///     │   └── TITLE
///     │       └── "Sample"
///     └── BODY class="main"
///         ├── UL
///         │   ├── LI "one"
///         │   └── LI "two"
///         └── <!-- note -->
/// ```
#[derive(Debug)]
pub struct SampleDocument {
    pub tree: Tree,
    pub doctype: NodeRef,
    pub html: NodeRef,
    pub head: NodeRef,
    pub title: NodeRef,
    pub title_text: NodeRef,
    pub body: NodeRef,
    pub list: NodeRef,
    pub items: [NodeRef; 2],
    pub item_texts: [NodeRef; 2],
    pub comment: NodeRef,
}

impl SampleDocument {
    pub fn new() -> Result<Self, TreeError> {
        let mut tree = Tree::new();
        let root = tree.root();

        let doctype = tree.create_doctype("html", "", "");
        tree.append_child(root, doctype)?;

        let html = tree.create_element("HTML")?;
        tree.append_child(root, html)?;

        let head = tree.create_element("HEAD")?;
        tree.append_child(html, head)?;
        let title = tree.create_element("TITLE")?;
        tree.append_child(head, title)?;
        let title_text = tree.create_text("Sample");
        tree.append_child(title, title_text)?;

        let body = tree.create_element("BODY")?;
        tree.set_attribute(body, "class", "main")?;
        tree.append_child(html, body)?;

        let list = tree.create_element("UL")?;
        tree.append_child(body, list)?;
        let mut items = [root; 2];
        let mut item_texts = [root; 2];
        for (i, label) in ["one", "two"].into_iter().enumerate() {
            let item = tree.create_element("LI")?;
            let text = tree.create_text(label);
            tree.append_child(item, text)?;
            tree.append_child(list, item)?;
            items[i] = item;
            item_texts[i] = text;
        }

        let comment = tree.create_comment(" note ");
        tree.append_child(body, comment)?;

        Ok(Self {
            tree,
            doctype,
            html,
            head,
            title,
            title_text,
            body,
            list,
            items,
            item_texts,
            comment,
        })
    }

    pub fn root(&self) -> NodeRef {
        self.tree.root()
    }

    /// Append a new `LI` with `label` to the list.
    pub fn push_item(&mut self, label: &str) -> Result<NodeRef, TreeError> {
        let item = self.tree.create_element("LI")?;
        let text = self.tree.create_text(label);
        self.tree.append_child(item, text)?;
        self.tree.append_child(self.list, item)?;
        Ok(item)
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

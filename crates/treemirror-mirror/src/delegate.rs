//! Hooks that let a host intercept node construction and attribute writes.

use treemirror_core::{NodeRef, SerializedNode, Tree};

/// Outcome of offering an operation to a [`MirrorDelegate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception<T> {
    /// The delegate performed the operation itself.
    Handled(T),
    /// The applier should perform the default operation.
    FallThrough,
}

impl<T> Interception<T> {
    pub fn is_handled(&self) -> bool {
        matches!(self, Interception::Handled(_))
    }
}

/// Host hooks consulted by the applier.
///
/// Both hooks default to [`Interception::FallThrough`]. Delegates are used for
/// sanitization and for substituting placeholder elements.
pub trait MirrorDelegate {
    /// Construct an element for a first-seen record.
    ///
    /// A handled element must be a fresh, parentless node of `tree`.
    fn create_element(
        &mut self,
        _tree: &mut Tree,
        _tag_name: &str,
        _record: &SerializedNode,
    ) -> Interception<NodeRef> {
        Interception::FallThrough
    }

    /// Set a non-null attribute value.
    fn set_attribute(
        &mut self,
        _tree: &mut Tree,
        _node: NodeRef,
        _name: &str,
        _value: &str,
    ) -> Interception<()> {
        Interception::FallThrough
    }
}

/// Delegate that never intercepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelegate;

impl MirrorDelegate for NoDelegate {}

/// Keeps mirrored `iframe` elements sandboxed.
///
/// Every `iframe` is created with `sandbox=""`, and later writes to its
/// `sandbox` attribute are swallowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxIframes;

impl SandboxIframes {
    fn is_iframe(tag_name: &str) -> bool {
        tag_name.eq_ignore_ascii_case("iframe")
    }
}

impl MirrorDelegate for SandboxIframes {
    fn create_element(
        &mut self,
        tree: &mut Tree,
        tag_name: &str,
        _record: &SerializedNode,
    ) -> Interception<NodeRef> {
        if !Self::is_iframe(tag_name) {
            return Interception::FallThrough;
        }
        let Ok(node) = tree.create_element(tag_name) else {
            return Interception::FallThrough;
        };
        match tree.set_attribute(node, "sandbox", "") {
            Ok(()) => Interception::Handled(node),
            Err(error) => {
                tracing::warn!(%error, "could not sandbox iframe");
                Interception::FallThrough
            }
        }
    }

    fn set_attribute(
        &mut self,
        tree: &mut Tree,
        node: NodeRef,
        name: &str,
        _value: &str,
    ) -> Interception<()> {
        let sandboxed = name.eq_ignore_ascii_case("sandbox")
            && tree.tag_name(node).is_some_and(Self::is_iframe);
        if sandboxed {
            Interception::Handled(())
        } else {
            Interception::FallThrough
        }
    }
}

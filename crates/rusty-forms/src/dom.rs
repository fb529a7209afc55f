// File: src/dom.rs
// Purpose: Host document capability the validator runs against

use std::fmt::Debug;

/// Selector used to find a field's label
pub const LABEL_SELECTOR: &str = "label";

/// The document the validator reads fields from and writes error markers to.
///
/// Selectors are opaque to the validator and interpreted by the host. Hosts
/// conventionally understand `ref:name` as "elements whose `data-ref` is
/// `name`". Every query returns elements in document order, and no method
/// panics or fails on a selector that matches nothing.
pub trait Dom {
    /// Handle to one element
    type Handle: Clone + PartialEq + Debug;

    /// Elements matching `selector` that are descendants of a chain of
    /// ancestors matching `within` (outermost first). An empty chain searches
    /// the whole document.
    fn query(&self, selector: &str, within: &[&str]) -> Vec<Self::Handle>;

    fn matches(&self, node: &Self::Handle, selector: &str) -> bool;

    fn attr(&self, node: &Self::Handle, name: &str) -> Option<String>;

    /// Current value of a form control
    fn value(&self, node: &Self::Handle) -> String;

    fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// Next element sibling
    fn next_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// Other children of the node's parent that match `selector`
    fn siblings(&self, node: &Self::Handle, selector: &str) -> Vec<Self::Handle>;

    /// The node itself or its nearest ancestor matching `selector`
    fn closest(&self, node: &Self::Handle, selector: &str) -> Option<Self::Handle>;

    fn add_class(&mut self, node: &Self::Handle, class: &str);

    fn remove_class(&mut self, node: &Self::Handle, class: &str);

    /// Insert markup right after `node`, returning the inserted element
    fn insert_after(&mut self, node: &Self::Handle, markup: &str) -> Option<Self::Handle>;

    /// Append markup as the last child of `parent`, returning the inserted element
    fn append(&mut self, parent: &Self::Handle, markup: &str) -> Option<Self::Handle>;

    /// Detach a node. Removing a detached node is a no-op.
    fn remove(&mut self, node: &Self::Handle);

    /// Remove all children
    fn empty(&mut self, node: &Self::Handle);

    /// Top offset of the element relative to the document
    fn offset_top(&self, node: &Self::Handle) -> f64;

    /// Request a smooth scroll of the document to `top`
    fn scroll_to(&mut self, top: f64);
}

/// A field's labels: sibling labels first, otherwise the enclosing label
pub fn labels_of<D: Dom>(dom: &D, node: &D::Handle) -> Vec<D::Handle> {
    let siblings = dom.siblings(node, LABEL_SELECTOR);

    if !siblings.is_empty() {
        return siblings;
    }

    dom.closest(node, LABEL_SELECTOR).into_iter().collect()
}

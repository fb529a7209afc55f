// File: src/scroll.rs
// Purpose: Scroll to the form (or a fixed offset) after a failed pass

use crate::config::{ScrollTarget, ValidationConfig};
use crate::dom::Dom;

/// Request a scroll when `valid` is false and scrolling is enabled.
///
/// Returns the requested offset. A selector that matches nothing is a no-op.
pub fn maybe_scroll<D: Dom>(dom: &mut D, valid: bool, config: &ValidationConfig) -> Option<f64> {
    if valid {
        return None;
    }

    let top = match &config.scroll_top {
        ScrollTarget::Disabled => return None,
        ScrollTarget::Offset(offset) => *offset,
        ScrollTarget::Selector(selector) => match dom.query(selector, &[]).first() {
            Some(target) => dom.offset_top(target),
            None => {
                tracing::warn!(%selector, "scroll target not found");
                return None;
            }
        },
    };

    dom.scroll_to(top);
    Some(top)
}

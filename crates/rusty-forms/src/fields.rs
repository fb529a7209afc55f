// File: src/fields.rs
// Purpose: Field discovery and per-field metadata extraction

use rusty_forms_validation::{RuleKind, Validatable};

use crate::config::ValidationConfig;
use crate::dom::Dom;

/// Presence marks a field as required
pub const REQUIRED_ATTR: &str = "data-required";
/// Selects the field's rule kind
pub const TYPE_ATTR: &str = "data-type";
/// Optional display name used in messages
pub const LABEL_ATTR: &str = "data-label";

/// Snapshot of one field, rebuilt on every pass
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor<H> {
    pub handle: H,
    pub required: bool,
    pub declared_type: Option<RuleKind>,
    pub label: Option<String>,
    pub value: String,
}

impl<H> Validatable for FieldDescriptor<H> {
    fn required(&self) -> bool {
        self.required
    }

    fn declared_type(&self) -> Option<&RuleKind> {
        self.declared_type.as_ref()
    }

    fn value(&self) -> &str {
        &self.value
    }
}

/// Read a field's metadata, or `None` if it is neither required nor typed
pub fn describe<D: Dom>(dom: &D, handle: &D::Handle) -> Option<FieldDescriptor<D::Handle>> {
    let required = dom.attr(handle, REQUIRED_ATTR).is_some();
    let declared_type = dom
        .attr(handle, TYPE_ATTR)
        .filter(|name| !name.trim().is_empty())
        .map(|name| RuleKind::parse(name.trim()));

    if !required && declared_type.is_none() {
        return None;
    }

    Some(FieldDescriptor {
        handle: handle.clone(),
        required,
        declared_type,
        label: dom.attr(handle, LABEL_ATTR).filter(|label| !label.is_empty()),
        value: dom.value(handle),
    })
}

/// Every required or typed field inside the form, in document order
pub fn collect<D: Dom>(dom: &D, config: &ValidationConfig) -> Vec<FieldDescriptor<D::Handle>> {
    let scope = config.field_scope();

    let fields: Vec<_> = dom
        .query(&config.field_selector, &scope)
        .iter()
        .filter_map(|handle| describe(dom, handle))
        .collect();

    tracing::debug!(
        selector = %config.field_selector,
        count = fields.len(),
        "collected fields"
    );

    fields
}

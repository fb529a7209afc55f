// File: src/error_state.rs
// Purpose: Applying and clearing error markers on fields and the global container

use rusty_forms_validation::{FailureKind, RuleEngine};

use crate::config::ValidationConfig;
use crate::dom::{labels_of, Dom, LABEL_SELECTOR};
use crate::error::Result;
use crate::fields::FieldDescriptor;
use crate::render::{MessageModel, MessageRenderer, ERROR_TEMPLATE};

/// One failing field and the marker rendered for it
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord<H> {
    pub field: H,
    pub kind: FailureKind,
    /// The inserted marker, if the host returned one
    pub node: Option<H>,
}

/// Sole writer of error state to the document.
///
/// Keeps the records of the current pass so a single field's marker can be
/// removed later without touching any other field's.
#[derive(Debug, Clone)]
pub struct ErrorStateManager<H> {
    records: Vec<ErrorRecord<H>>,
}

impl<H: Clone + PartialEq + std::fmt::Debug> ErrorStateManager<H> {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn records(&self) -> &[ErrorRecord<H>] {
        &self.records
    }

    /// Remove every error class and marker in the form, and reset the global
    /// container if one is configured.
    pub fn clear_all<D: Dom<Handle = H>>(&mut self, dom: &mut D, config: &ValidationConfig) {
        let scope = config.field_scope();

        for field in dom.query(&config.field_selector, &scope) {
            unmark(dom, &field, &config.error_class);
        }

        for marker in dom.query(&config.error_selector, &scope) {
            dom.remove(&marker);
        }

        for record in self.records.drain(..) {
            if let Some(node) = &record.node {
                dom.remove(node);
            }
        }

        if let Some(selector) = &config.global_errors_selector {
            for container in dom.query(selector, &[]) {
                dom.remove_class(&container, &config.active_class);
                dom.empty(&container);
            }
        }
    }

    /// Remove the error class and marker of one field only
    pub fn clear_one<D: Dom<Handle = H>>(&mut self, dom: &mut D, field: &H, config: &ValidationConfig) {
        unmark(dom, field, &config.error_class);

        let (own, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|record| record.field == *field);
        self.records = others;

        for record in own {
            if let Some(node) = &record.node {
                dom.remove(node);
            }
        }

        // Markers next to the field that no other field owns
        for marker in dom.siblings(field, &config.error_selector) {
            let claimed = self
                .records
                .iter()
                .any(|record| record.node.as_ref() == Some(&marker));
            if !claimed {
                dom.remove(&marker);
            }
        }

        tracing::debug!(?field, "cleared field error");
    }

    /// Mark a field invalid and insert its rendered message
    pub fn apply_error<D, R>(
        &mut self,
        dom: &mut D,
        field: &FieldDescriptor<H>,
        kind: FailureKind,
        rules: &RuleEngine,
        renderer: &R,
        config: &ValidationConfig,
    ) -> Result<ErrorRecord<H>>
    where
        D: Dom<Handle = H>,
        R: MessageRenderer + ?Sized,
    {
        if let Some(index) = self.records.iter().position(|r| r.field == field.handle) {
            let stale = self.records.remove(index);
            if let Some(node) = &stale.node {
                dom.remove(node);
            }
        }

        dom.add_class(&field.handle, &config.error_class);
        for label in labels_of(dom, &field.handle) {
            dom.add_class(&label, &config.error_class);
        }

        let model = MessageModel {
            kind,
            field_label: field.label.clone(),
            rule_description: field
                .declared_type
                .as_ref()
                .and_then(|declared| rules.rule(declared))
                .map(|rule| rule.description().to_string()),
            error_selector: config.error_ref().to_string(),
        };
        let markup = renderer.render(ERROR_TEMPLATE, &model)?;

        let node = match global_container(dom, config) {
            Some(container) => {
                dom.add_class(&container, &config.active_class);
                dom.append(&container, &markup)
            }
            None => insert_inline(dom, &field.handle, &markup),
        };

        let record = ErrorRecord {
            field: field.handle.clone(),
            kind,
            node,
        };
        self.records.push(record.clone());

        Ok(record)
    }
}

impl<H: Clone + PartialEq + std::fmt::Debug> Default for ErrorStateManager<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn unmark<D: Dom>(dom: &mut D, field: &D::Handle, class: &str) {
    dom.remove_class(field, class);
    for label in labels_of(dom, field) {
        dom.remove_class(&label, class);
    }
}

fn global_container<D: Dom>(dom: &D, config: &ValidationConfig) -> Option<D::Handle> {
    let selector = config.global_errors_selector.as_deref()?;
    let container = dom.query(selector, &[]).into_iter().next();

    if container.is_none() {
        tracing::warn!(%selector, "global errors container not found, rendering inline");
    }

    container
}

/// After the field when a label follows it, otherwise at the end of its parent
fn insert_inline<D: Dom>(dom: &mut D, field: &D::Handle, markup: &str) -> Option<D::Handle> {
    let label_follows = dom
        .next_sibling(field)
        .map_or(false, |next| dom.matches(&next, LABEL_SELECTOR));

    if label_follows {
        return dom.insert_after(field, markup);
    }

    match dom.parent(field) {
        Some(parent) => dom.append(&parent, markup),
        None => {
            tracing::warn!(?field, "field has no parent, error marker not inserted");
            None
        }
    }
}

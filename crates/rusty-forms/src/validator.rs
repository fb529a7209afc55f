// File: src/validator.rs
// Purpose: FormValidator orchestration, event bindings and the validation pass

use rusty_forms_validation::RuleEngine;

use crate::config::{resolve, Callbacks, ConfigOverrides, ValidationConfig};
use crate::dom::Dom;
use crate::error::Result;
use crate::error_state::{ErrorRecord, ErrorStateManager};
use crate::fields;
use crate::render::{MessageRenderer, TemplateRenderer};
use crate::scroll;

/// Identifies one registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

/// Handlers registered by [`FormValidator::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub submit: BindingId,
    pub focus: BindingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingEvent {
    Submit,
    Focus,
}

struct Binding<H> {
    id: BindingId,
    event: BindingEvent,
    namespace: String,
    overrides: ConfigOverrides,
    callbacks: Callbacks<H>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
    Unbound,
    Bound,
}

/// What the host should do with a submit event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No binding for this form; submission proceeds natively
    Unhandled,
    /// The form is valid and submission proceeds
    Submit,
    /// Default submission must be prevented
    Prevented { valid: bool },
}

impl SubmitOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, SubmitOutcome::Prevented { .. })
    }

    /// Whether a validation pass ran and passed
    pub fn is_valid(&self) -> Option<bool> {
        match self {
            SubmitOutcome::Unhandled => None,
            SubmitOutcome::Submit => Some(true),
            SubmitOutcome::Prevented { valid } => Some(*valid),
        }
    }
}

/// Result of one validation pass
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport<H> {
    pub valid: bool,
    pub errors: Vec<ErrorRecord<H>>,
    /// Offset a scroll was requested to, if any
    pub scrolled_to: Option<f64>,
}

/// Validates a form against a host document.
///
/// Unbound until [`init`](Self::init) or [`bind_fields`](Self::bind_fields)
/// registers handlers, Bound until [`destroy`](Self::destroy). Events reach
/// the validator through [`handle_submit`](Self::handle_submit) and
/// [`handle_focus`](Self::handle_focus).
pub struct FormValidator<D: Dom> {
    defaults: ValidationConfig,
    overrides: ConfigOverrides,
    callbacks: Callbacks<D::Handle>,
    rules: RuleEngine,
    renderer: Box<dyn MessageRenderer>,
    errors: ErrorStateManager<D::Handle>,
    bindings: Vec<Binding<D::Handle>>,
    next_binding: u64,
}

impl<D: Dom> FormValidator<D> {
    pub fn new() -> Self {
        Self {
            defaults: ValidationConfig::default(),
            overrides: ConfigOverrides::default(),
            callbacks: Callbacks::default(),
            rules: RuleEngine::new(),
            renderer: Box::new(TemplateRenderer::new()),
            errors: ErrorStateManager::new(),
            bindings: Vec::new(),
            next_binding: 0,
        }
    }

    pub fn with_defaults(mut self, defaults: ValidationConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Instance-level overrides, applied under every call's options
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks<D::Handle>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn with_rules(mut self, rules: RuleEngine) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_renderer(mut self, renderer: impl MessageRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn rules_mut(&mut self) -> &mut RuleEngine {
        &mut self.rules
    }

    pub fn state(&self) -> ValidatorState {
        if self.bindings.is_empty() {
            ValidatorState::Unbound
        } else {
            ValidatorState::Bound
        }
    }

    /// Records of the markers currently rendered by this validator
    pub fn errors(&self) -> &[ErrorRecord<D::Handle>] {
        self.errors.records()
    }

    /// Resolve a config snapshot for a call
    pub fn config(&self, options: &ConfigOverrides) -> ValidationConfig {
        resolve(&self.defaults, &self.overrides, options)
    }

    /// Bind the focus handler and the submit handler.
    ///
    /// Calling `init` while bound replaces the previous bindings.
    pub fn init(&mut self, options: ConfigOverrides, callbacks: Callbacks<D::Handle>) -> Bindings {
        if self.state() == ValidatorState::Bound {
            tracing::debug!("validator already bound, replacing bindings");
            self.destroy();
        }

        let focus = self.bind_fields(options.clone());
        let submit = self.register(BindingEvent::Submit, options, callbacks);

        Bindings { submit, focus }
    }

    /// Bind the handler that clears a field's error when it gains focus
    pub fn bind_fields(&mut self, options: ConfigOverrides) -> BindingId {
        self.register(BindingEvent::Focus, options, Callbacks::default())
    }

    /// Remove one binding. Returns false if it was not registered.
    pub fn revoke(&mut self, id: BindingId) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|binding| binding.id != id);
        let removed = self.bindings.len() != before;

        if removed {
            tracing::debug!(?id, "binding revoked");
        }

        removed
    }

    /// Remove every binding of this instance. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        for binding in self.bindings.drain(..) {
            tracing::debug!(
                id = ?binding.id,
                event = ?binding.event,
                namespace = %binding.namespace,
                "binding removed"
            );
        }
    }

    /// Run a validation pass and report whether every field passed
    pub fn is_valid(&mut self, dom: &mut D, options: &ConfigOverrides) -> Result<bool> {
        Ok(self.validate(dom, options)?.valid)
    }

    /// Run a validation pass: clear all markers, evaluate every field, mark
    /// failures, and scroll if anything failed.
    pub fn validate(
        &mut self,
        dom: &mut D,
        options: &ConfigOverrides,
    ) -> Result<ValidationReport<D::Handle>> {
        let config = self.config(options);
        self.run_pass(dom, &config)
    }

    /// Deliver a submit event for `form`
    pub fn handle_submit(&mut self, dom: &mut D, form: &D::Handle) -> Result<SubmitOutcome> {
        let Some(binding) = self
            .bindings
            .iter()
            .find(|binding| binding.event == BindingEvent::Submit)
        else {
            return Ok(SubmitOutcome::Unhandled);
        };

        let callbacks = self.callbacks.layered(&binding.callbacks);
        let config = self.config(&binding.overrides);

        if !is_bound_form(dom, form, &config) {
            return Ok(SubmitOutcome::Unhandled);
        }

        let report = self.run_pass(dom, &config)?;

        if !report.valid {
            if let Some(on_invalid) = &callbacks.on_invalid {
                on_invalid();
            }
            return Ok(SubmitOutcome::Prevented { valid: false });
        }

        if let Some(on_valid) = &callbacks.on_valid {
            on_valid(form);
        }

        if config.ajax {
            Ok(SubmitOutcome::Prevented { valid: true })
        } else {
            Ok(SubmitOutcome::Submit)
        }
    }

    /// Deliver a focus event for `field`. Returns true if an error was cleared
    /// for it.
    pub fn handle_focus(&mut self, dom: &mut D, field: &D::Handle) -> bool {
        let Some(binding) = self
            .bindings
            .iter()
            .find(|binding| binding.event == BindingEvent::Focus)
        else {
            return false;
        };

        let config = self.config(&binding.overrides);

        if !dom.matches(field, &config.field_selector) || fields::describe(dom, field).is_none() {
            return false;
        }

        self.errors.clear_one(dom, field, &config);
        true
    }

    fn register(
        &mut self,
        event: BindingEvent,
        overrides: ConfigOverrides,
        callbacks: Callbacks<D::Handle>,
    ) -> BindingId {
        let id = BindingId(self.next_binding);
        self.next_binding += 1;

        let namespace = self.config(&overrides).namespace;
        tracing::debug!(?id, ?event, %namespace, "binding registered");

        self.bindings.push(Binding {
            id,
            event,
            namespace,
            overrides,
            callbacks,
        });

        id
    }

    fn run_pass(
        &mut self,
        dom: &mut D,
        config: &ValidationConfig,
    ) -> Result<ValidationReport<D::Handle>> {
        tracing::debug!(namespace = %config.namespace, "validation pass started");
        self.errors.clear_all(dom, config);

        let fields = fields::collect(dom, config);
        let mut errors = Vec::new();

        for field in &fields {
            if let Some(kind) = self.rules.evaluate(field) {
                let record = self.errors.apply_error(
                    dom,
                    field,
                    kind,
                    &self.rules,
                    self.renderer.as_ref(),
                    config,
                )?;
                errors.push(record);
            }
        }

        let valid = errors.is_empty();
        let scrolled_to = scroll::maybe_scroll(dom, valid, config);

        tracing::debug!(
            namespace = %config.namespace,
            fields = fields.len(),
            failures = errors.len(),
            valid,
            "validation pass complete"
        );

        Ok(ValidationReport {
            valid,
            errors,
            scrolled_to,
        })
    }
}

impl<D: Dom> Default for FormValidator<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_bound_form<D: Dom>(dom: &D, form: &D::Handle, config: &ValidationConfig) -> bool {
    if !dom.matches(form, &config.form_selector) {
        return false;
    }

    match &config.form_context {
        Some(context) => dom
            .parent(form)
            .map_or(false, |parent| dom.closest(&parent, context).is_some()),
        None => true,
    }
}

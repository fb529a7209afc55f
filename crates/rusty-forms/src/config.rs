// File: src/config.rs
// Purpose: Validation options, override layers and their resolution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::error::ConfigError;

/// Fully resolved options for one operation.
///
/// A fresh value is produced by [`resolve`] for every `init`/`is_valid` call
/// and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Tag carried by this instance's event bindings
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Form(s) the submit binding listens on
    #[serde(default = "default_form_selector")]
    pub form_selector: String,

    /// Optional outer scope for the form, for pages with several forms
    #[serde(default)]
    pub form_context: Option<String>,

    /// Candidate fields, queried inside the form
    #[serde(default = "default_field_selector")]
    pub field_selector: String,

    /// Rendered error markers, removed at the start of every pass
    #[serde(default = "default_error_selector")]
    pub error_selector: String,

    /// When set, all messages go into this container instead of next to fields
    #[serde(default)]
    pub global_errors_selector: Option<String>,

    #[serde(default = "default_error_class")]
    pub error_class: String,

    /// Class put on the global container while it holds messages
    #[serde(default = "default_active_class")]
    pub active_class: String,

    #[serde(default)]
    pub scroll_top: ScrollTarget,

    /// Prevent native submission even when the form is valid
    #[serde(default)]
    pub ajax: bool,
}

fn default_namespace() -> String {
    "formValidator".to_string()
}

fn default_form_selector() -> String {
    "ref:form".to_string()
}

fn default_field_selector() -> String {
    "ref:formField".to_string()
}

fn default_error_selector() -> String {
    "ref:formError".to_string()
}

fn default_error_class() -> String {
    "-error".to_string()
}

fn default_active_class() -> String {
    "-is-active".to_string()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            form_selector: default_form_selector(),
            form_context: None,
            field_selector: default_field_selector(),
            error_selector: default_error_selector(),
            global_errors_selector: None,
            error_class: default_error_class(),
            active_class: default_active_class(),
            scroll_top: ScrollTarget::default(),
            ajax: false,
        }
    }
}

impl ValidationConfig {
    /// Ancestor selectors fields are queried within, outermost first
    pub fn field_scope(&self) -> Vec<&str> {
        self.form_context
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.form_selector.as_str()))
            .collect()
    }

    /// Error selector with any `ref:` prefix removed, as templates expect it
    pub fn error_ref(&self) -> &str {
        self.error_selector
            .strip_prefix("ref:")
            .unwrap_or(&self.error_selector)
    }
}

/// Where to scroll after a failed pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScrollTarget", into = "RawScrollTarget")]
pub enum ScrollTarget {
    Disabled,
    Offset(f64),
    /// Scroll to the top offset of the first element matching this selector
    Selector(String),
}

impl Default for ScrollTarget {
    fn default() -> Self {
        ScrollTarget::Offset(0.0)
    }
}

/// Wire shape of `scrollTop`: `false`, a number or a selector string
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawScrollTarget {
    Flag(bool),
    Offset(f64),
    Selector(String),
}

impl TryFrom<RawScrollTarget> for ScrollTarget {
    type Error = String;

    fn try_from(raw: RawScrollTarget) -> Result<Self, Self::Error> {
        match raw {
            RawScrollTarget::Flag(false) => Ok(ScrollTarget::Disabled),
            RawScrollTarget::Flag(true) => {
                Err("scrollTop accepts false, a number or a selector, not true".to_string())
            }
            RawScrollTarget::Offset(offset) => Ok(ScrollTarget::Offset(offset)),
            RawScrollTarget::Selector(selector) => Ok(ScrollTarget::Selector(selector)),
        }
    }
}

impl From<ScrollTarget> for RawScrollTarget {
    fn from(target: ScrollTarget) -> Self {
        match target {
            ScrollTarget::Disabled => RawScrollTarget::Flag(false),
            ScrollTarget::Offset(offset) => RawScrollTarget::Offset(offset),
            ScrollTarget::Selector(selector) => RawScrollTarget::Selector(selector),
        }
    }
}

/// One override layer (instance level or call level).
///
/// Unknown keys are rejected when parsing. `formContext` and
/// `globalErrorsSelector` may be `null` to switch off a value set by a lower
/// layer; absent keys leave it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub form_context: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub global_errors_selector: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_top: Option<ScrollTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ajax: Option<bool>,
}

/// A present key is `Some`, even when its value is `null`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load overrides from a TOML file.
    ///
    /// A missing or empty file yields no overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Self::from_toml(&content)
    }

    /// This layer with `later` on top, key by key
    pub fn layered(&self, later: &ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            namespace: later.namespace.clone().or_else(|| self.namespace.clone()),
            form_selector: later.form_selector.clone().or_else(|| self.form_selector.clone()),
            form_context: later.form_context.clone().or_else(|| self.form_context.clone()),
            field_selector: later.field_selector.clone().or_else(|| self.field_selector.clone()),
            error_selector: later.error_selector.clone().or_else(|| self.error_selector.clone()),
            global_errors_selector: later
                .global_errors_selector
                .clone()
                .or_else(|| self.global_errors_selector.clone()),
            error_class: later.error_class.clone().or_else(|| self.error_class.clone()),
            active_class: later.active_class.clone().or_else(|| self.active_class.clone()),
            scroll_top: later.scroll_top.clone().or_else(|| self.scroll_top.clone()),
            ajax: later.ajax.or(self.ajax),
        }
    }

    fn apply_to(&self, config: &mut ValidationConfig) {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(selector) = &self.form_selector {
            config.form_selector = selector.clone();
        }
        if let Some(context) = &self.form_context {
            config.form_context = context.clone();
        }
        if let Some(selector) = &self.field_selector {
            config.field_selector = selector.clone();
        }
        if let Some(selector) = &self.error_selector {
            config.error_selector = selector.clone();
        }
        if let Some(selector) = &self.global_errors_selector {
            config.global_errors_selector = selector.clone();
        }
        if let Some(class) = &self.error_class {
            config.error_class = class.clone();
        }
        if let Some(class) = &self.active_class {
            config.active_class = class.clone();
        }
        if let Some(target) = &self.scroll_top {
            config.scroll_top = target.clone();
        }
        if let Some(ajax) = self.ajax {
            config.ajax = ajax;
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn form_selector(mut self, selector: impl Into<String>) -> Self {
        self.form_selector = Some(selector.into());
        self
    }

    pub fn form_context(mut self, selector: impl Into<String>) -> Self {
        self.form_context = Some(Some(selector.into()));
        self
    }

    /// Drop a form context set by a lower layer
    pub fn without_form_context(mut self) -> Self {
        self.form_context = Some(None);
        self
    }

    pub fn field_selector(mut self, selector: impl Into<String>) -> Self {
        self.field_selector = Some(selector.into());
        self
    }

    pub fn error_selector(mut self, selector: impl Into<String>) -> Self {
        self.error_selector = Some(selector.into());
        self
    }

    pub fn global_errors_selector(mut self, selector: impl Into<String>) -> Self {
        self.global_errors_selector = Some(Some(selector.into()));
        self
    }

    /// Render inline even if a lower layer configured a global container
    pub fn without_global_errors(mut self) -> Self {
        self.global_errors_selector = Some(None);
        self
    }

    pub fn error_class(mut self, class: impl Into<String>) -> Self {
        self.error_class = Some(class.into());
        self
    }

    pub fn active_class(mut self, class: impl Into<String>) -> Self {
        self.active_class = Some(class.into());
        self
    }

    pub fn scroll_top(mut self, target: ScrollTarget) -> Self {
        self.scroll_top = Some(target);
        self
    }

    pub fn ajax(mut self, ajax: bool) -> Self {
        self.ajax = Some(ajax);
        self
    }
}

/// Merge defaults, instance overrides and call overrides; the call wins.
///
/// Shallow and key by key. No input is modified.
pub fn resolve(
    defaults: &ValidationConfig,
    instance: &ConfigOverrides,
    call: &ConfigOverrides,
) -> ValidationConfig {
    let mut config = defaults.clone();
    instance.apply_to(&mut config);
    call.apply_to(&mut config);
    config
}

pub type ValidCallback<H> = Rc<dyn Fn(&H)>;
pub type InvalidCallback = Rc<dyn Fn()>;

/// Submit callbacks. Layered like [`ConfigOverrides`]: a later layer replaces
/// each callback wholesale.
pub struct Callbacks<H> {
    /// Called with the form handle when a submitted form is valid
    pub on_valid: Option<ValidCallback<H>>,
    pub on_invalid: Option<InvalidCallback>,
}

impl<H> Callbacks<H> {
    pub fn new() -> Self {
        Self {
            on_valid: None,
            on_invalid: None,
        }
    }

    pub fn on_valid(mut self, callback: impl Fn(&H) + 'static) -> Self {
        self.on_valid = Some(Rc::new(callback));
        self
    }

    pub fn on_invalid(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_invalid = Some(Rc::new(callback));
        self
    }

    pub fn layered(&self, later: &Callbacks<H>) -> Callbacks<H> {
        Callbacks {
            on_valid: later.on_valid.clone().or_else(|| self.on_valid.clone()),
            on_invalid: later.on_invalid.clone().or_else(|| self.on_invalid.clone()),
        }
    }
}

impl<H> Default for Callbacks<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for Callbacks<H> {
    fn clone(&self) -> Self {
        Self {
            on_valid: self.on_valid.clone(),
            on_invalid: self.on_invalid.clone(),
        }
    }
}

impl<H> fmt::Debug for Callbacks<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_valid", &self.on_valid.is_some())
            .field("on_invalid", &self.on_invalid.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert_eq!(config.namespace, "formValidator");
        assert_eq!(config.form_selector, "ref:form");
        assert_eq!(config.field_selector, "ref:formField");
        assert_eq!(config.error_selector, "ref:formError");
        assert_eq!(config.error_class, "-error");
        assert_eq!(config.active_class, "-is-active");
        assert_eq!(config.scroll_top, ScrollTarget::Offset(0.0));
        assert!(config.global_errors_selector.is_none());
        assert!(!config.ajax);
    }

    #[test]
    fn test_call_layer_wins() {
        let defaults = ValidationConfig::default();
        let instance = ConfigOverrides::new().error_class("has-error").ajax(true);
        let call = ConfigOverrides::new().error_class("is-invalid");

        let config = resolve(&defaults, &instance, &call);
        assert_eq!(config.error_class, "is-invalid");
        assert!(config.ajax);
        assert_eq!(config.field_selector, "ref:formField");
    }

    #[test]
    fn test_resolve_leaves_inputs_untouched() {
        let defaults = ValidationConfig::default();
        let instance = ConfigOverrides::new().namespace("checkout");
        let call = ConfigOverrides::new().scroll_top(ScrollTarget::Disabled);

        let _ = resolve(&defaults, &instance, &call);
        assert_eq!(defaults, ValidationConfig::default());
        assert_eq!(instance, ConfigOverrides::new().namespace("checkout"));
        assert_eq!(call, ConfigOverrides::new().scroll_top(ScrollTarget::Disabled));
    }

    #[test]
    fn test_scroll_top_from_json() {
        let off = ConfigOverrides::from_json(r#"{"scrollTop": false}"#).unwrap();
        assert_eq!(off.scroll_top, Some(ScrollTarget::Disabled));

        let offset = ConfigOverrides::from_json(r#"{"scrollTop": 120}"#).unwrap();
        assert_eq!(offset.scroll_top, Some(ScrollTarget::Offset(120.0)));

        let selector = ConfigOverrides::from_json(r##"{"scrollTop": "#top"}"##).unwrap();
        assert_eq!(selector.scroll_top, Some(ScrollTarget::Selector("#top".to_string())));

        assert!(ConfigOverrides::from_json(r#"{"scrollTop": true}"#).is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = ConfigOverrides::from_json(r#"{"ajaxRequest": true}"#).unwrap_err();
        assert!(err.to_string().contains("ajaxRequest"));

        assert!(ConfigOverrides::from_toml("fieldSelectr = \"x\"").is_err());
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            formSelector = "ref:checkout"
            globalErrorsSelector = "ref:errors"
            scrollTop = "ref:checkout"
        "#;
        let overrides = ConfigOverrides::from_toml(toml).unwrap();
        let config = resolve(&ValidationConfig::default(), &ConfigOverrides::new(), &overrides);

        assert_eq!(config.form_selector, "ref:checkout");
        assert_eq!(config.global_errors_selector.as_deref(), Some("ref:errors"));
        assert_eq!(config.scroll_top, ScrollTarget::Selector("ref:checkout".to_string()));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let overrides = ConfigOverrides::load("does/not/exist/validate.toml").unwrap();
        assert_eq!(overrides, ConfigOverrides::default());
    }

    #[test]
    fn test_load_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("validate.toml");
        fs::write(&path, "errorClass = \"is-invalid\"\najax = true\nscrollTop = false\n").unwrap();

        let overrides = ConfigOverrides::load(&path).unwrap();

        assert_eq!(
            overrides,
            ConfigOverrides::new()
                .error_class("is-invalid")
                .ajax(true)
                .scroll_top(ScrollTarget::Disabled)
        );
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("validate.toml");
        fs::write(&path, "  \n\n").unwrap();

        assert_eq!(ConfigOverrides::load(&path).unwrap(), ConfigOverrides::default());
    }

    #[test]
    fn test_load_rejects_unknown_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("validate.toml");
        fs::write(&path, "errorClas = \"x\"\n").unwrap();

        assert!(matches!(ConfigOverrides::load(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_null_switches_off_lower_layer() {
        let instance = ConfigOverrides::new()
            .global_errors_selector("ref:errors")
            .form_context("#checkout");
        let call = ConfigOverrides::from_json(r#"{"globalErrorsSelector": null}"#).unwrap();

        assert_eq!(call, ConfigOverrides::new().without_global_errors());

        let config = resolve(&ValidationConfig::default(), &instance, &call);
        assert_eq!(config.global_errors_selector, None);
        assert_eq!(config.form_context.as_deref(), Some("#checkout"));

        let call = ConfigOverrides::new().without_form_context();
        let config = resolve(&ValidationConfig::default(), &instance, &call);
        assert_eq!(config.form_context, None);
        assert_eq!(config.global_errors_selector.as_deref(), Some("ref:errors"));
    }

    #[test]
    fn test_absent_key_keeps_lower_layer() {
        let instance = ConfigOverrides::new().global_errors_selector("ref:errors");
        let call = ConfigOverrides::from_json(r#"{"ajax": true}"#).unwrap();

        assert_eq!(call.global_errors_selector, None);
        let config = resolve(&ValidationConfig::default(), &instance, &call);
        assert_eq!(config.global_errors_selector.as_deref(), Some("ref:errors"));
    }

    #[test]
    fn test_layered_overrides() {
        let base = ConfigOverrides::new().error_class("a").active_class("on");
        let top = ConfigOverrides::new().error_class("b");
        let merged = base.layered(&top);
        assert_eq!(merged.error_class.as_deref(), Some("b"));
        assert_eq!(merged.active_class.as_deref(), Some("on"));
    }

    #[test]
    fn test_field_scope_and_error_ref() {
        let config = resolve(
            &ValidationConfig::default(),
            &ConfigOverrides::new().form_context("ref:checkout"),
            &ConfigOverrides::new(),
        );
        assert_eq!(config.field_scope(), vec!["ref:checkout", "ref:form"]);
        assert_eq!(config.error_ref(), "formError");

        let plain = ValidationConfig {
            error_selector: ".form-error".to_string(),
            ..ValidationConfig::default()
        };
        assert_eq!(plain.error_ref(), ".form-error");
    }

    #[test]
    fn test_callbacks_replaced_wholesale() {
        let hits = Rc::new(Cell::new(0));
        let first = Rc::clone(&hits);
        let second = Rc::clone(&hits);

        let base: Callbacks<u32> = Callbacks::new().on_invalid(move || first.set(first.get() + 1));
        let top: Callbacks<u32> = Callbacks::new().on_invalid(move || second.set(second.get() + 10));

        let merged = base.layered(&top);
        (merged.on_invalid.unwrap())();
        assert_eq!(hits.get(), 10);
        assert!(merged.on_valid.is_none());
    }
}

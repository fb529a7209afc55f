// File: src/render.rs
// Purpose: Message rendering capability and the default template renderer

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use rusty_forms_validation::FailureKind;
use serde::Serialize;
use std::collections::HashMap;

/// Template id the validator asks the renderer for
pub const ERROR_TEMPLATE: &str = "validate.error";

const DEFAULT_ERROR_MARKUP: &str =
    r#"<span class="form-error" data-ref="{errorSelector}">{message}</span>"#;

/// Data handed to the renderer for one failing field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageModel {
    pub kind: FailureKind,
    /// The field's label override, if any
    pub field_label: Option<String>,
    /// Noun for the declared type, e.g. "zip code"
    pub rule_description: Option<String>,
    /// Error selector without its `ref:` prefix
    pub error_selector: String,
}

/// Turns a failure into markup. Supplied by the host.
pub trait MessageRenderer {
    /// `template` is a template id or raw markup
    fn render(&self, template: &str, model: &MessageModel) -> Result<String>;
}

/// Renders `{name}` placeholders into registered templates.
///
/// Available variables: `type`, `field`, `description`, `errorSelector` and
/// `message` (the per-kind sentence, itself interpolated first). A template
/// id that is not registered is used as markup directly.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: HashMap<String, String>,
    messages: HashMap<FailureKind, String>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        templates.insert(ERROR_TEMPLATE.to_string(), DEFAULT_ERROR_MARKUP.to_string());

        let mut messages = HashMap::new();
        messages.insert(FailureKind::MissingRequiredValue, "{field} is required".to_string());
        messages.insert(FailureKind::InvalidFormat, "Please enter a valid {description}".to_string());
        messages.insert(FailureKind::InvalidChecksum, "Please enter a valid {description}".to_string());

        Self { templates, messages }
    }

    pub fn with_template(mut self, id: impl Into<String>, markup: impl Into<String>) -> Self {
        self.templates.insert(id.into(), markup.into());
        self
    }

    pub fn with_message(mut self, kind: FailureKind, message: impl Into<String>) -> Self {
        self.messages.insert(kind, message.into());
        self
    }

    fn variables(&self, model: &MessageModel) -> HashMap<&'static str, String> {
        let field = model
            .field_label
            .as_deref()
            .map(escape_html)
            .unwrap_or_else(|| "This field".to_string());
        let description = model
            .rule_description
            .as_deref()
            .map(escape_html)
            .unwrap_or_else(|| "value".to_string());

        let mut vars = HashMap::new();
        vars.insert("type", model.kind.as_str().to_string());
        vars.insert("field", field);
        vars.insert("description", description);
        vars.insert("errorSelector", escape_html(&model.error_selector));
        vars
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer for TemplateRenderer {
    fn render(&self, template: &str, model: &MessageModel) -> Result<String> {
        let mut vars = self.variables(model);

        let message = self
            .messages
            .get(&model.kind)
            .map(|text| interpolate(text, &vars))
            .unwrap_or_default();
        vars.insert("message", message);

        let markup = self
            .templates
            .get(template)
            .map(String::as_str)
            .unwrap_or(template);

        Ok(interpolate(markup, &vars))
    }
}

/// Replace `{name}` placeholders, leaving unknown ones untouched
fn interpolate(content: &str, vars: &HashMap<&'static str, String>) -> String {
    static VAR_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

    VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .to_string()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model(kind: FailureKind) -> MessageModel {
        MessageModel {
            kind,
            field_label: None,
            rule_description: None,
            error_selector: "formError".to_string(),
        }
    }

    #[test]
    fn test_required_message() {
        let renderer = TemplateRenderer::new();
        let mut model = model(FailureKind::MissingRequiredValue);
        model.field_label = Some("Email".to_string());

        let html = renderer.render(ERROR_TEMPLATE, &model).unwrap();
        assert_eq!(
            html,
            r#"<span class="form-error" data-ref="formError">Email is required</span>"#
        );
    }

    #[test]
    fn test_invalid_message_uses_description() {
        let renderer = TemplateRenderer::new();
        let mut model = model(FailureKind::InvalidChecksum);
        model.rule_description = Some("credit card number".to_string());

        let html = renderer.render(ERROR_TEMPLATE, &model).unwrap();
        assert!(html.contains("Please enter a valid credit card number"));
    }

    #[test]
    fn test_raw_markup_template() {
        let renderer = TemplateRenderer::new();
        let html = renderer
            .render("<em data-ref=\"{errorSelector}\">{type}</em>", &model(FailureKind::InvalidFormat))
            .unwrap();
        assert_eq!(html, "<em data-ref=\"formError\">invalid</em>");
    }

    #[test]
    fn test_labels_are_escaped() {
        let renderer = TemplateRenderer::new();
        let mut model = model(FailureKind::MissingRequiredValue);
        model.field_label = Some("<b>Name</b>".to_string());

        let html = renderer.render(ERROR_TEMPLATE, &model).unwrap();
        assert!(html.contains("&lt;b&gt;Name&lt;/b&gt; is required"));
    }

    #[test]
    fn test_custom_message_and_unknown_placeholder() {
        let renderer = TemplateRenderer::new()
            .with_message(FailureKind::MissingRequiredValue, "Fill in {field} {later}");
        let html = renderer
            .render(ERROR_TEMPLATE, &model(FailureKind::MissingRequiredValue))
            .unwrap();
        assert!(html.contains("Fill in This field {later}"));
    }
}

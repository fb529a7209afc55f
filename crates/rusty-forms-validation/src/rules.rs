//! Rule kinds, failure kinds and the rule engine

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::luhn::is_valid_luhn;
use crate::patterns;

/// Declared type of a field, selecting exactly one pattern rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    Email,
    CreditCard,
    Cvv,
    Zip,
    Phone,
    /// Any other name. Validates only if a rule was registered under it.
    Custom(String),
}

impl RuleKind {
    /// Parse the value of a type attribute (`"email"`, `"creditCard"`, ...)
    ///
    /// # Examples
    /// ```
    /// use rusty_forms_validation::RuleKind;
    /// assert_eq!(RuleKind::parse("creditCard"), RuleKind::CreditCard);
    /// assert_eq!(RuleKind::parse("iban"), RuleKind::Custom("iban".to_string()));
    /// ```
    pub fn parse(name: &str) -> Self {
        match name {
            "email" => RuleKind::Email,
            "creditCard" => RuleKind::CreditCard,
            "cvv" => RuleKind::Cvv,
            "zip" => RuleKind::Zip,
            "phone" => RuleKind::Phone,
            custom => RuleKind::Custom(custom.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Email => "email",
            RuleKind::CreditCard => "creditCard",
            RuleKind::Cvv => "cvv",
            RuleKind::Zip => "zip",
            RuleKind::Phone => "phone",
            RuleKind::Custom(name) => name,
        }
    }
}

impl From<String> for RuleKind {
    fn from(name: String) -> Self {
        RuleKind::parse(&name)
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a field failed. These are expected outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    MissingRequiredValue,
    InvalidFormat,
    InvalidChecksum,
}

impl FailureKind {
    /// Short message type passed to templates
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingRequiredValue => "required",
            FailureKind::InvalidFormat => "invalid",
            FailureKind::InvalidChecksum => "checksum",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-stage check run after the pattern matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    Luhn,
}

impl Checksum {
    fn verify(self, value: &str) -> bool {
        match self {
            Checksum::Luhn => is_valid_luhn(value),
        }
    }
}

/// A pattern rule with an optional checksum and the noun used in messages
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    description: String,
    checksum: Option<Checksum>,
}

impl Rule {
    pub fn new(pattern: Regex, description: impl Into<String>) -> Self {
        Self {
            pattern,
            description: description.into(),
            checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: Checksum) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Human noun for the kind of value, e.g. "zip code"
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Run the pattern, then the checksum if the pattern matched
    pub fn check(&self, value: &str) -> Option<FailureKind> {
        if !self.pattern.is_match(value) {
            return Some(FailureKind::InvalidFormat);
        }

        match self.checksum {
            Some(checksum) if !checksum.verify(value) => Some(FailureKind::InvalidChecksum),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for rule '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// What the engine needs to know about a field
pub trait Validatable {
    fn required(&self) -> bool;
    fn declared_type(&self) -> Option<&RuleKind>;
    fn value(&self) -> &str;
}

/// Owned field snapshot for callers without their own field type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldInput {
    pub required: bool,
    pub declared_type: Option<RuleKind>,
    pub value: String,
}

impl FieldInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            required: false,
            declared_type: None,
            value: value.into(),
        }
    }

    pub fn require(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn typed(mut self, kind: RuleKind) -> Self {
        self.declared_type = Some(kind);
        self
    }
}

impl Validatable for FieldInput {
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

/// Rule table keyed by [`RuleKind`]
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: HashMap<RuleKind, Rule>,
}

impl RuleEngine {
    /// Engine with the built-in email, credit card, cvv, zip and phone rules
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            RuleKind::Email,
            Rule::new(patterns::EMAIL_REGEX.clone(), "email"),
        );
        rules.insert(
            RuleKind::CreditCard,
            Rule::new(patterns::CREDIT_CARD_REGEX.clone(), "credit card number")
                .with_checksum(Checksum::Luhn),
        );
        rules.insert(RuleKind::Cvv, Rule::new(patterns::CVV_REGEX.clone(), "cvv"));
        rules.insert(
            RuleKind::Zip,
            Rule::new(patterns::ZIP_REGEX.clone(), "zip code"),
        );
        rules.insert(
            RuleKind::Phone,
            Rule::new(
                patterns::PHONE_REGEX.clone(),
                "phone number (e.g. 123-456-7890)",
            ),
        );

        Self { rules }
    }

    /// Register a pattern rule under `name`, replacing any rule of that kind.
    ///
    /// A replaced rule's checksum stays in force, so re-registering
    /// `creditCard` still runs Luhn after the new pattern.
    pub fn register(
        &mut self,
        name: &str,
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<RuleKind, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        let kind = RuleKind::parse(name);

        let mut rule = Rule::new(regex, description);
        if let Some(checksum) = self.rules.get(&kind).and_then(|existing| existing.checksum) {
            rule = rule.with_checksum(checksum);
        }

        if self.rules.insert(kind.clone(), rule).is_some() {
            tracing::debug!(rule = %kind, "replaced existing rule");
        }

        Ok(kind)
    }

    pub fn rule(&self, kind: &RuleKind) -> Option<&Rule> {
        self.rules.get(kind)
    }

    pub fn is_registered(&self, kind: &RuleKind) -> bool {
        self.rules.contains_key(kind)
    }

    /// Evaluate one field.
    ///
    /// Required emptiness (after trimming) short-circuits format checks. An
    /// empty optional field is never failed. A declared type with no
    /// registered rule is treated as valid.
    pub fn evaluate(&self, field: &impl Validatable) -> Option<FailureKind> {
        let value = field.value();

        if value.trim().is_empty() {
            return field
                .required()
                .then_some(FailureKind::MissingRequiredValue);
        }

        let kind = field.declared_type()?;

        match self.rules.get(kind) {
            Some(rule) => rule.check(value),
            None => {
                tracing::warn!(declared_type = %kind, "no rule registered for declared type, treating value as valid");
                None
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parse_round_trips_names() {
        for name in ["email", "creditCard", "cvv", "zip", "phone", "iban"] {
            assert_eq!(RuleKind::parse(name).as_str(), name);
        }
    }

    #[test]
    fn required_empty_short_circuits() {
        let engine = RuleEngine::new();
        let field = FieldInput::new("   ").require().typed(RuleKind::Email);
        assert_eq!(engine.evaluate(&field), Some(FailureKind::MissingRequiredValue));
    }

    #[test]
    fn optional_empty_is_never_failed() {
        let engine = RuleEngine::new();
        assert_eq!(engine.evaluate(&FieldInput::new("")), None);
        assert_eq!(engine.evaluate(&FieldInput::new("").typed(RuleKind::Zip)), None);
    }

    #[test]
    fn untyped_fields_skip_format_checks() {
        let engine = RuleEngine::new();
        assert_eq!(engine.evaluate(&FieldInput::new("anything at all").require()), None);
    }

    #[rstest]
    #[case(RuleKind::Zip, "12345", None)]
    #[case(RuleKind::Zip, "12345-6789", None)]
    #[case(RuleKind::Zip, "1234", Some(FailureKind::InvalidFormat))]
    #[case(RuleKind::Cvv, "123", None)]
    #[case(RuleKind::Cvv, "1234", None)]
    #[case(RuleKind::Cvv, "12", Some(FailureKind::InvalidFormat))]
    #[case(RuleKind::Cvv, "12345", Some(FailureKind::InvalidFormat))]
    #[case(RuleKind::Email, "not-an-email", Some(FailureKind::InvalidFormat))]
    #[case(RuleKind::CreditCard, "4111111111111111", None)]
    #[case(RuleKind::CreditCard, "4111111111111112", Some(FailureKind::InvalidChecksum))]
    #[case(RuleKind::CreditCard, "0000 0000 0000 0000", Some(FailureKind::InvalidChecksum))]
    #[case(RuleKind::CreditCard, "4111-abcd", Some(FailureKind::InvalidFormat))]
    fn built_in_rules(
        #[case] kind: RuleKind,
        #[case] value: &str,
        #[case] expected: Option<FailureKind>,
    ) {
        let engine = RuleEngine::new();
        let field = FieldInput::new(value).require().typed(kind);
        assert_eq!(engine.evaluate(&field), expected);
    }

    #[test]
    fn unregistered_custom_type_is_valid() {
        let engine = RuleEngine::new();
        let field = FieldInput::new("whatever").typed(RuleKind::parse("iban"));
        assert_eq!(engine.evaluate(&field), None);
    }

    #[test]
    fn registered_custom_type_is_checked() {
        let mut engine = RuleEngine::new();
        let kind = engine
            .register("postcode", r"^[A-Z]{1,2}[0-9][0-9A-Z]? ?[0-9][A-Z]{2}$", "postcode")
            .unwrap();

        assert_eq!(kind, RuleKind::Custom("postcode".to_string()));
        assert_eq!(engine.rule(&kind).unwrap().description(), "postcode");
        assert_eq!(engine.evaluate(&FieldInput::new("SW1A 1AA").typed(kind.clone())), None);
        assert_eq!(
            engine.evaluate(&FieldInput::new("12345").typed(kind)),
            Some(FailureKind::InvalidFormat)
        );
    }

    #[test]
    fn re_registered_credit_card_keeps_luhn() {
        let mut engine = RuleEngine::new();
        let kind = engine.register("creditCard", r"^[0-9\-\s]+$", "card").unwrap();

        assert_eq!(kind, RuleKind::CreditCard);
        assert_eq!(engine.rule(&kind).unwrap().description(), "card");
        assert_eq!(
            engine.evaluate(&FieldInput::new("4111111111111112").typed(RuleKind::CreditCard)),
            Some(FailureKind::InvalidChecksum)
        );
        assert_eq!(
            engine.evaluate(&FieldInput::new("4111111111111111").typed(RuleKind::CreditCard)),
            None
        );
    }

    #[test]
    fn invalid_custom_pattern_is_rejected() {
        let mut engine = RuleEngine::new();
        let err = engine.register("broken", "([a-z", "broken").unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}

//! rusty-forms validation rules
//!
//! The rule engine behind the form validator. It knows nothing about documents
//! or markup: it takes one field's `required` flag, declared type and current
//! value, and reports at most one [`FailureKind`].
//!
//! ```rust
//! use rusty_forms_validation::{FailureKind, FieldInput, RuleEngine, RuleKind};
//!
//! let engine = RuleEngine::new();
//! let card = FieldInput::new("4111111111111112").typed(RuleKind::CreditCard);
//! assert_eq!(engine.evaluate(&card), Some(FailureKind::InvalidChecksum));
//! ```

pub mod luhn;
pub mod patterns;
pub mod rules;

pub use luhn::is_valid_luhn;
pub use rules::{
    Checksum, FailureKind, FieldInput, Rule, RuleEngine, RuleError, RuleKind, Validatable,
};

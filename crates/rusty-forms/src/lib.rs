//! # rusty-forms
//!
//! Declarative client-side form validation. Fields flagged as required or
//! typed are checked on submit (or on demand), invalid fields and their labels
//! get an error class, and a rendered message is placed next to each field or
//! in one global container. Focusing a field clears its own error.
//!
//! The validator never talks to a browser directly. It runs against a [`Dom`]
//! supplied by the host: `rusty-forms-wasm` provides one over `web-sys`, and
//! [`MemoryDom`] is an in-memory document for tests and headless use.
//!
//! ## Quick Start
//!
//! ```rust
//! use rusty_forms::{ConfigOverrides, Dom, FormValidator, MemoryDom};
//!
//! let mut dom = MemoryDom::new();
//! let root = dom.root();
//! let form = dom.append_element(&root, "form", &[("data-ref", "form")]);
//! let email = dom.append_element(
//!     &form,
//!     "input",
//!     &[("data-ref", "formField"), ("data-required", ""), ("data-type", "email")],
//! );
//! dom.set_value(&email, "not-an-email");
//!
//! let mut validator = FormValidator::new();
//! assert!(!validator.is_valid(&mut dom, &ConfigOverrides::new()).unwrap());
//! assert_eq!(dom.query("ref:formError", &[]).len(), 1);
//! ```
//!
//! ## Field attributes
//!
//! - `data-required` - the field fails when its trimmed value is empty
//! - `data-type` - one of `email`, `creditCard`, `cvv`, `zip`, `phone` or a
//!   registered custom rule
//! - `data-label` - name used in messages

pub mod config;
pub mod dom;
pub mod error;
pub mod error_state;
pub mod fields;
pub mod memory;
pub mod render;
pub mod scroll;
pub mod validator;

pub use config::{resolve, Callbacks, ConfigOverrides, ScrollTarget, ValidationConfig};
pub use dom::Dom;
pub use error::{ConfigError, ValidateError};
pub use error_state::{ErrorRecord, ErrorStateManager};
pub use fields::FieldDescriptor;
pub use memory::{MemoryDom, NodeId};
pub use render::{MessageModel, MessageRenderer, TemplateRenderer};
pub use validator::{
    BindingEvent, BindingId, Bindings, FormValidator, SubmitOutcome, ValidationReport,
    ValidatorState,
};

pub use rusty_forms_validation as rules;
pub use rusty_forms_validation::{FailureKind, RuleEngine, RuleKind};

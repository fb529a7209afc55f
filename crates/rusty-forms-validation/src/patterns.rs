//! Pattern table for the built-in rule kinds
//!
//! Digit classes are spelled `[0-9]` because `\d` in `regex` also matches
//! non-ASCII digits.

use once_cell::sync::Lazy;
use regex::Regex;

/// Local part (dotted atoms or a quoted string) `@` a dotted domain with a 2+
/// letter TLD, or a bracketed IPv4 literal. Case-sensitive.
pub const EMAIL: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;

/// Digits, hyphens and whitespace only. The checksum runs separately.
pub const CREDIT_CARD: &str = r"^[0-9\-\s]+$";

pub const CVV: &str = r"^[0-9]{3,4}$";

pub const ZIP: &str = r"(^[0-9]{5}$)|(^[0-9]{5}-[0-9]{4}$)";

/// US style `(ddd) ddd-dddd`, parentheses and separators optional.
pub const PHONE: &str = r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$";

pub static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(EMAIL).unwrap());
pub static CREDIT_CARD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(CREDIT_CARD).unwrap());
pub static CVV_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(CVV).unwrap());
pub static ZIP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(ZIP).unwrap());
pub static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(PHONE).unwrap());

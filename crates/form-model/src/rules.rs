//! Per-type validation rules
//!
//! Every rule is pure and total: any string is either accepted or rejected
//! with a [`FieldIssue`], never an error. Only the empty string counts as
//! empty; Number and Phone trim before parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Minimum number of digits in a phone number once separators are removed
pub const MIN_PHONE_DIGITS: usize = 7;

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9 ().\-]+$").expect("phone pattern is a valid regex")
});

/// Why a value was rejected (drives inline messages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssue {
    #[error("this field is required")]
    Required,

    #[error("value must be a number")]
    NotANumber,

    #[error("value must be a valid phone number")]
    InvalidPhone,

    #[error("value must be \"yes\" or \"no\"")]
    InvalidChoice,
}

/// Signature shared by all rules: `(required, raw value)`
pub type Rule = fn(bool, &str) -> Result<(), FieldIssue>;

#[inline]
fn require(required: bool, raw: &str) -> Result<(), FieldIssue> {
    if required && raw.is_empty() {
        Err(FieldIssue::Required)
    } else {
        Ok(())
    }
}

/// TextField, TextArea, Date and Select: required means non-empty
pub fn non_empty(required: bool, raw: &str) -> Result<(), FieldIssue> {
    require(required, raw)
}

/// Number: required means non-empty, any non-empty value must be finite
pub fn number(required: bool, raw: &str) -> Result<(), FieldIssue> {
    require(required, raw)?;
    if raw.is_empty() {
        return Ok(());
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(()),
        _ => Err(FieldIssue::NotANumber),
    }
}

/// Checkbox: required means the literal `"true"`
pub fn checkbox(required: bool, raw: &str) -> Result<(), FieldIssue> {
    if required && raw != "true" {
        Err(FieldIssue::Required)
    } else {
        Ok(())
    }
}

/// YesNo: required means non-empty, any non-empty value is `yes` or `no`
pub fn yes_no(required: bool, raw: &str) -> Result<(), FieldIssue> {
    require(required, raw)?;
    if raw.is_empty() || matches!(raw, "yes" | "no") {
        Ok(())
    } else {
        Err(FieldIssue::InvalidChoice)
    }
}

/// Phone: required means non-empty; non-empty values must look like an
/// international number with at least [`MIN_PHONE_DIGITS`] digits
pub fn phone(required: bool, raw: &str) -> Result<(), FieldIssue> {
    require(required, raw)?;
    if raw.is_empty() {
        return Ok(());
    }
    let value = raw.trim();
    if !PHONE_PATTERN.is_match(value) {
        return Err(FieldIssue::InvalidPhone);
    }
    let digits = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')' | '+'))
        .count();
    if digits < MIN_PHONE_DIGITS {
        return Err(FieldIssue::InvalidPhone);
    }
    Ok(())
}

/// Heading and RichText: nothing to validate
pub fn always(_required: bool, _raw: &str) -> Result<(), FieldIssue> {
    Ok(())
}

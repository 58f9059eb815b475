//! Formwright Validation Engine
//!
//! Whole-submission validation against a (snapshotted) form document.
//!
//! Every interactive field is checked in document order against
//! `answers[field_id]`, falling back to the empty string when the field was
//! not answered. A submission may be completed only if every field passes;
//! partial saves skip validation entirely.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use form_model::{FieldId, FieldIssue, FormDocument};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Submitted values keyed by field id
pub type Answers = BTreeMap<FieldId, String>;

/// Pass/fail per interactive field, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationResult {
    outcomes: IndexMap<FieldId, bool>,
}

impl ValidationResult {
    /// True if every field passed
    #[inline]
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.outcomes.values().all(|passed| *passed)
    }

    /// Outcome for one field, if it was checked
    #[inline]
    #[must_use]
    pub fn get(&self, field_id: &FieldId) -> Option<bool> {
        self.outcomes.get(field_id).copied()
    }

    /// Ids of the fields that failed, in document order
    pub fn failed(&self) -> impl Iterator<Item = &FieldId> {
        self.outcomes
            .iter()
            .filter(|(_, passed)| !**passed)
            .map(|(id, _)| id)
    }

    /// All outcomes in document order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, bool)> {
        self.outcomes.iter().map(|(id, passed)| (id, *passed))
    }

    /// Number of fields checked
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True when the document has no interactive fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Validate answers against every interactive field of `document`
#[must_use]
pub fn validate_submission(document: &FormDocument, answers: &Answers) -> ValidationResult {
    let outcomes = document
        .interactive_fields()
        .map(|field| {
            let raw = answers.get(&field.id).map_or("", String::as_str);
            (field.id.clone(), field.validate(raw))
        })
        .collect();
    ValidationResult { outcomes }
}

/// Validation result plus the reason behind each failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub result: ValidationResult,
    pub issues: IndexMap<FieldId, FieldIssue>,
}

impl ValidationReport {
    /// True if every field passed
    #[inline]
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.result.is_acceptable()
    }

    /// Inline message for a failed field
    #[must_use]
    pub fn message_for(&self, field_id: &FieldId) -> Option<String> {
        self.issues.get(field_id).map(ToString::to_string)
    }
}

/// Like [`validate_submission`] but keeps the issue for each failed field
#[must_use]
pub fn report(document: &FormDocument, answers: &Answers) -> ValidationReport {
    let mut report = ValidationReport::default();
    for field in document.interactive_fields() {
        let raw = answers.get(&field.id).map_or("", String::as_str);
        let outcome = field.check(raw);
        report.result.outcomes.insert(field.id.clone(), outcome.is_ok());
        if let Err(issue) = outcome {
            report.issues.insert(field.id.clone(), issue);
        }
    }
    report
}

/// Live (per-keystroke / on-blur) check of one field
///
/// # Errors
/// - `UnknownField` if the document has no such field
/// - `NotInteractive` for headings and rich text
/// - `Rejected` with the issue if the value is not acceptable
pub fn validate_field(
    document: &FormDocument,
    field_id: &FieldId,
    raw: &str,
) -> Result<(), ValidationError> {
    let field = document
        .field(field_id)
        .ok_or_else(|| ValidationError::UnknownField(field_id.clone()))?;
    if !field.is_interactive() {
        return Err(ValidationError::NotInteractive(field_id.clone()));
    }
    field.check(raw).map_err(|issue| ValidationError::Rejected {
        field_id: field_id.clone(),
        issue,
    })
}

/// Check that every answer key names an interactive field of `document`
///
/// # Errors
/// `UnknownAnswerFields` listing every offending key
pub fn check_answer_keys(document: &FormDocument, answers: &Answers) -> Result<(), ValidationError> {
    let unknown: Vec<FieldId> = answers
        .keys()
        .filter(|id| !document.field(id).is_some_and(|f| f.is_interactive()))
        .cloned()
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnknownAnswerFields(unknown))
    }
}

/// Validation errors with diagnostic information
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No field with this id
    #[error("unknown field: {0}")]
    UnknownField(FieldId),

    /// Field is presentational and takes no value
    #[error("field {0} does not accept a value")]
    NotInteractive(FieldId),

    /// Value rejected by the field's rule
    #[error("field {field_id}: {issue}")]
    Rejected { field_id: FieldId, issue: FieldIssue },

    /// Answer keys that are not interactive fields of the document
    #[error("answers reference unknown fields: {0:?}")]
    UnknownAnswerFields(Vec<FieldId>),
}

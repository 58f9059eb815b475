//! Error types for persistence and submission recording

use crate::status::SaveStatus;
use crate::submission::SubmissionId;
use form_model::{FieldId, FormId, ModelError};
use form_validation::ValidationResult;

/// Storage-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Transient I/O failure of the backing store
    #[error("persistence failure: {0}")]
    Failure(String),

    /// No document has been stored for this form
    #[error("form not found: {0}")]
    FormNotFound(FormId),

    /// Stored bytes could not be interpreted
    #[error("stored document is unreadable: {0}")]
    Corrupt(String),
}

impl PersistenceError {
    /// Create transient failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

impl From<ModelError> for PersistenceError {
    fn from(err: ModelError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Illegal save-status transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal save status transition: {from} -> {to}")]
pub struct StatusError {
    pub from: SaveStatus,
    pub to: SaveStatus,
}

/// Failures of a submission write
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    /// Answers name fields that are not interactive fields of the form
    #[error("answers reference unknown fields: {0:?}")]
    UnknownAnswerField(Vec<FieldId>),

    /// Completion refused; the result names every failing field
    #[error("submission is not acceptable ({} field(s) failed)", .0.failed().count())]
    Invalid(ValidationResult),

    /// Finalized submissions are read-only
    #[error("submission {0} is already complete")]
    AlreadyComplete(SubmissionId),

    /// Underlying store failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

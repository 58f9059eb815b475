//! Error types for the editor runtime

use crate::chat::MessageId;
use crate::config::ConfigError;
use form_model::ModelError;
use form_mutation::MutationError;
use form_persistence::{PersistenceError, SubmissionError};
use form_validation::ValidationError;

/// Umbrella error for editor operations
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// First-open setup was rejected
    #[error("invalid form setup: {0}")]
    InvalidSetup(String),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller is not allowed to act on the session or form
    #[error("authorization failure: {0}")]
    AuthorizationFailure(String),

    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("message {0} was not written by the assistant")]
    NotAssistantMessage(MessageId),
}

impl FormError {
    /// Structural error behind this one, if any
    #[must_use]
    pub fn mutation(&self) -> Option<&MutationError> {
        match self {
            Self::Mutation(e) => Some(e.root_cause()),
            _ => None,
        }
    }
}

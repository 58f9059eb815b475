//! Error types for structural commands

use form_model::{FieldId, FieldType, ModelError, SectionId};

/// Caller-visible failure of one command
///
/// A failed command never partially applies: the input document is left
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Target section does not exist
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),

    /// Target field does not exist anywhere in the document
    #[error("field not found: {0}")]
    FieldNotFound(FieldId),

    /// Proposed order is not an exact permutation of the current ids
    #[error("reorder set mismatch (missing: {missing:?}, unexpected: {unexpected:?})")]
    ReorderSetMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Type tag not present in the registry
    #[error("unknown field type: '{0}'")]
    UnknownFieldType(String),

    /// Attributes do not fit the field type's schema
    #[error("invalid attributes for {field_type}: {reason}")]
    InvalidAttributes {
        field_type: FieldType,
        reason: String,
    },

    /// Supplied sections or fields collide on an id
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Replacement would leave the document without sections
    #[error("document must contain at least one section")]
    EmptyDocument,

    /// Command JSON failed shape validation at the boundary
    #[error("command failed schema validation: {}", .0.join("; "))]
    SchemaValidationFailure(Vec<String>),

    /// A command inside a batch failed; nothing in the batch was applied
    #[error("command {index} of batch failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<MutationError>,
    },

    /// The id source kept returning empty or taken ids
    #[error("no fresh id after {draws} draws")]
    IdSourceExhausted { draws: usize },

    /// Document could not be encoded or decoded
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl MutationError {
    /// Create reorder mismatch from id lists
    pub fn reorder_mismatch<T: ToString>(missing: &[T], unexpected: &[T]) -> Self {
        Self::ReorderSetMismatch {
            missing: missing.iter().map(ToString::to_string).collect(),
            unexpected: unexpected.iter().map(ToString::to_string).collect(),
        }
    }

    /// Innermost error, looking through batch wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<ModelError> for MutationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownFieldType(tag) => Self::UnknownFieldType(tag),
            ModelError::InvalidAttributes { field_type, reason } => {
                Self::InvalidAttributes { field_type, reason }
            }
            ModelError::EmptyDocument => Self::EmptyDocument,
            ModelError::DuplicateSectionId(id) => Self::DuplicateId(id.to_string()),
            ModelError::DuplicateFieldId(id) => Self::DuplicateId(id.to_string()),
            ModelError::Encoding(e) => Self::Encoding(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_onto_command_taxonomy() {
        let err: MutationError = ModelError::UnknownFieldType("Signature".into()).into();
        assert_eq!(err, MutationError::UnknownFieldType("Signature".into()));

        let err: MutationError = ModelError::DuplicateFieldId(FieldId::new("f1")).into();
        assert_eq!(err, MutationError::DuplicateId("f1".into()));
    }

    #[test]
    fn root_cause_unwraps_batches() {
        let inner = MutationError::FieldNotFound(FieldId::new("x"));
        let err = MutationError::Batch {
            index: 2,
            source: Box::new(inner.clone()),
        };
        assert_eq!(err.root_cause(), &inner);
        assert!(err.to_string().starts_with("command 2 of batch failed"));
    }

    #[test]
    fn schema_failure_lists_all_reasons() {
        let err = MutationError::SchemaValidationFailure(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "command failed schema validation: a; b");
    }
}

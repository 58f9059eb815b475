//! Error types for the form model

use crate::field::FieldType;
use crate::ids::{FieldId, SectionId};

/// Errors raised while constructing or decoding form documents
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Type tag not present in the registry
    #[error("unknown field type: '{0}'")]
    UnknownFieldType(String),

    /// Attributes do not match the schema of the field type
    #[error("invalid attributes for {field_type}: {reason}")]
    InvalidAttributes {
        field_type: FieldType,
        reason: String,
    },

    /// A document needs at least one section
    #[error("document must contain at least one section")]
    EmptyDocument,

    /// Two sections share an identifier
    #[error("duplicate section id: {0}")]
    DuplicateSectionId(SectionId),

    /// Two fields share an identifier (anywhere in the document)
    #[error("duplicate field id: {0}")]
    DuplicateFieldId(FieldId),

    /// Encoded document is not valid JSON for the model
    #[error("invalid document encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ModelError {
    /// Create attribute error for a field type
    pub fn invalid_attributes(field_type: FieldType, reason: impl Into<String>) -> Self {
        Self::InvalidAttributes {
            field_type,
            reason: reason.into(),
        }
    }
}

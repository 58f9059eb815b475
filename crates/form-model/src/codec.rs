//! Persisted document encoding
//!
//! A document is stored as one JSON blob: an array of sections, each with
//! its array of field instances. Every save carries the complete document.

use crate::document::FormDocument;
use crate::error::ModelError;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};

/// JSON-encoded [`FormDocument`], exactly as stored
///
/// Snapshots keep these bytes verbatim so later edits never change how a
/// historical submission is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedDocument(String);

impl EncodedDocument {
    /// Encode a document
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn encode(document: &FormDocument) -> Result<Self, ModelError> {
        Ok(Self(serde_json::to_string(document)?))
    }

    /// Wrap bytes read back from storage (not checked until decoded)
    #[inline]
    #[must_use]
    pub fn from_stored(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    /// Decode and check invariants
    ///
    /// # Errors
    /// Returns error if the JSON is malformed, a field type is unknown,
    /// attributes do not fit their type, or an invariant is violated
    pub fn decode(&self) -> Result<FormDocument, ModelError> {
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Raw JSON text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encoded size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for an empty blob
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blake3 hash of the encoded bytes
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(self.0.as_bytes())
    }
}

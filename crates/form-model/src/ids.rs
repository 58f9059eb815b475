//! Identifiers for forms, sections and fields
//!
//! IDs arriving from storage or from the AI collaborator are arbitrary
//! strings, so every identifier is a string newtype. Freshly generated IDs
//! come from an [`IdSource`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh ULID-backed identifier
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new().to_string())
            }

            /// Borrow as string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if the identifier is the empty string
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a form (the durable record key)
    FormId
);
string_id!(
    /// Identifier of a section, unique within a document
    SectionId
);
string_id!(
    /// Identifier of a field instance, unique across a whole document
    FieldId
);

/// Source of fresh identifiers for newly inserted sections and fields
pub trait IdSource {
    /// Next field identifier
    fn next_field_id(&mut self) -> FieldId;

    /// Next section identifier
    fn next_section_id(&mut self) -> SectionId;
}

/// ULID-backed identifiers (the production default)
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidIds;

impl IdSource for UlidIds {
    fn next_field_id(&mut self) -> FieldId {
        FieldId::generate()
    }

    fn next_section_id(&mut self) -> SectionId {
        SectionId::generate()
    }
}

/// Deterministic counter-based identifiers (`field-1`, `section-1`, ...)
///
/// Used for reproducible fixtures and CLI runs.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    fields: u64,
    sections: u64,
}

impl SequentialIds {
    /// Start both counters at 1
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdSource for SequentialIds {
    fn next_field_id(&mut self) -> FieldId {
        self.fields += 1;
        FieldId(format!("field-{}", self.fields))
    }

    fn next_section_id(&mut self) -> SectionId {
        self.sections += 1;
        SectionId(format!("section-{}", self.sections))
    }
}

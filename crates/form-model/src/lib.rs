//! Formwright Form Model
//!
//! Typed form documents and the field type registry.
//!
//! # Core Concepts
//!
//! - [`FormDocument`]: ordered sections of ordered field instances, with
//!   document-wide id uniqueness
//! - [`FieldKind`]: tagged union of field types and their typed attributes
//! - [`FieldTypeDefinition`]: registry entry (construct defaults, validate)
//! - [`EncodedDocument`]: the JSON blob persisted per form
//! - [`ContentHash`]: Blake3 digest used for content-equality checks
//!
//! # Example
//!
//! ```rust
//! use form_model::{FieldId, FieldInstance, FieldType, FormDocument, Section, SectionId};
//!
//! let name = FieldInstance::construct(FieldType::TextField, FieldId::new("name"));
//! let doc = FormDocument::new(vec![
//!     Section::new(SectionId::new("s1"), "About you").with_elements(vec![name]),
//! ])
//! .unwrap();
//!
//! assert!(doc.field(&FieldId::new("name")).unwrap().validate(""));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod codec;
mod document;
mod error;
mod field;
mod hash;
mod ids;
pub mod registry;
pub mod rules;

pub use codec::EncodedDocument;
pub use document::{check_invariants, FormDocument, Section};
pub use error::ModelError;
pub use field::{
    Align, BasicAttributes, FieldInstance, FieldKind, FieldType, HeadingAttributes,
    InputAttributes, RichTextAttributes, SelectAttributes, TextAreaAttributes,
};
pub use hash::ContentHash;
pub use ids::{FieldId, FormId, IdSource, SectionId, SequentialIds, UlidIds};
pub use registry::{FieldCategory, FieldTypeDefinition};
pub use rules::FieldIssue;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

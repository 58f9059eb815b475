//! Formwright Mutation Protocol
//!
//! The closed set of structural commands shared by the interactive builder
//! and the AI collaborator.
//!
//! # Guarantees
//!
//! - Operations are pure: `&FormDocument -> Result<FormDocument, _>`
//! - A failed command or batch leaves the document untouched
//! - Every successful operation preserves document-wide id uniqueness
//! - Tool-call JSON is shape-checked against the command schema before
//!   it is decoded
//!
//! # Example
//!
//! ```rust
//! use form_model::{FormDocument, SectionId, SequentialIds};
//! use form_mutation::parse_command;
//! use serde_json::json;
//!
//! let doc = FormDocument::blank(SectionId::new("s1"));
//! let command = parse_command(&json!({
//!     "type": "addElementsToSection",
//!     "sectionId": "s1",
//!     "elements": [{ "type": "Phone", "extraAttributes": { "required": true } }]
//! }))
//! .unwrap();
//!
//! let next = command.apply(&doc, &mut SequentialIds::new()).unwrap();
//! assert_eq!(next.field_count(), 1);
//! assert_eq!(doc.field_count(), 0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod apply;
mod batch;
mod command;
mod error;
mod schema;

pub use apply::{
    add_elements_to_section, create_section, delete_fields, reorder_fields, reorder_sections,
    replace_form, update_field,
};
pub use batch::apply_batch;
pub use command::{FieldInput, FieldUpdate, MutationCommand, SectionInput};
pub use error::MutationError;
pub use schema::{command_schema, parse_command, parse_command_str, parse_commands, validate_shape};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Formwright Core
//!
//! Editor orchestration on top of the document model, the mutation
//! protocol and the persistence pipeline:
//!
//! - [`FormEditor`] owns one form's document for a client session and
//!   applies human commands, raw tool calls and assistant actions to it
//! - [`ChatSession`] records the assistant conversation about a form and
//!   which proposed actions were applied
//! - [`FormwrightConfig`] loads runtime settings from TOML or YAML
//!
//! # Example
//!
//! ```rust
//! use form_core::{FormEditor, FormSetup};
//! use form_model::{FormId, SequentialIds};
//! use serde_json::json;
//!
//! let mut editor = FormEditor::open(
//!     FormId::new("signup"),
//!     FormSetup::new("Sign-up"),
//!     Box::new(SequentialIds::new()),
//! )
//! .unwrap();
//!
//! editor
//!     .apply_tool_call(&json!({
//!         "type": "addElementsToSection",
//!         "sectionId": "section-1",
//!         "elements": [{ "type": "TextField", "extraAttributes": { "label": "Name" } }]
//!     }))
//!     .unwrap();
//! assert_eq!(editor.document().field_count(), 1);
//!
//! assert!(editor.undo());
//! assert_eq!(editor.document().field_count(), 0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod chat;
pub mod config;
pub mod editor;
pub mod error;

pub use chat::{Caller, ChatMessage, ChatRole, ChatSession, ChatSessionId, MessageId, UserId};
pub use config::{ConfigError, FormwrightConfig};
pub use editor::{FormEditor, FormSetup};
pub use error::FormError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Command shape validation at the tool-call boundary
//!
//! Raw JSON from the AI collaborator is checked against the JSON Schema
//! generated from [`MutationCommand`] before it is decoded. A command that
//! fails here is reported as a failed tool invocation and never reaches the
//! document.

use crate::command::MutationCommand;
use crate::error::MutationError;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

static COMMAND_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::to_value(schemars::schema_for!(MutationCommand)).unwrap_or(Value::Bool(false))
});

static COMPILED_SCHEMA: Lazy<Result<JSONSchema, String>> =
    Lazy::new(|| JSONSchema::compile(&COMMAND_SCHEMA).map_err(|e| e.to_string()));

/// JSON Schema of a single mutation command
#[must_use]
pub fn command_schema() -> &'static Value {
    &COMMAND_SCHEMA
}

/// Check the shape of one raw command
///
/// # Errors
/// `SchemaValidationFailure` listing every violation with its JSON pointer
pub fn validate_shape(raw: &Value) -> Result<(), MutationError> {
    let schema = COMPILED_SCHEMA
        .as_ref()
        .map_err(|e| MutationError::SchemaValidationFailure(vec![e.clone()]))?;

    schema.validate(raw).map_err(|errors| {
        let reasons = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();
        MutationError::SchemaValidationFailure(reasons)
    })
}

/// Shape-check then decode one command
///
/// # Errors
/// `SchemaValidationFailure` if the shape is wrong
pub fn parse_command(raw: &Value) -> Result<MutationCommand, MutationError> {
    validate_shape(raw)?;
    serde_json::from_value(raw.clone())
        .map_err(|e| MutationError::SchemaValidationFailure(vec![e.to_string()]))
}

/// Shape-check then decode a command from JSON text
///
/// # Errors
/// `SchemaValidationFailure` if the text is not JSON or the shape is wrong
pub fn parse_command_str(json: &str) -> Result<MutationCommand, MutationError> {
    let raw: Value = serde_json::from_str(json)
        .map_err(|e| MutationError::SchemaValidationFailure(vec![e.to_string()]))?;
    parse_command(&raw)
}

/// Shape-check and decode a list of commands (a JSON array or one object)
///
/// Every command is checked before any is returned.
///
/// # Errors
/// `Batch { index, .. }` wrapping the first failing command's error
pub fn parse_commands(raw: &Value) -> Result<Vec<MutationCommand>, MutationError> {
    let items = match raw {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            parse_command(item).map_err(|source| MutationError::Batch {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

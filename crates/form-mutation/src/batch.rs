//! Atomic command batches
//!
//! Commands are applied strictly in order; each sees the result of the
//! previous one. If any command fails the batch fails as a whole and the
//! caller keeps its original document.

use crate::command::MutationCommand;
use crate::error::MutationError;
use form_model::{FormDocument, IdSource};

/// Apply `commands` in order
///
/// # Errors
/// `Batch { index, source }` naming the first failing command
pub fn apply_batch(
    document: &FormDocument,
    commands: &[MutationCommand],
    ids: &mut dyn IdSource,
) -> Result<FormDocument, MutationError> {
    let result = commands
        .iter()
        .enumerate()
        .try_fold(document.clone(), |current, (index, command)| {
            command
                .apply(&current, &mut *ids)
                .map_err(|source| MutationError::Batch {
                    index,
                    source: Box::new(source),
                })
        });

    match &result {
        Ok(_) => tracing::debug!(commands = commands.len(), "Applied batch"),
        Err(e) => tracing::warn!(error = %e, "Batch rolled back"),
    }
    result
}

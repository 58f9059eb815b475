//! Save status state machine
//!
//! ```text
//! Idle ──► Saving ──► Saved ──► Idle
//!            │          │
//!            ▼          └──► Saving
//!          Error ──► Saving
//! ```

use crate::error::StatusError;
use crate::store::FormVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable state of the persistence pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    /// Nothing in flight; last write (if any) has been acknowledged
    #[default]
    Idle,
    /// One write in flight
    Saving,
    /// Last write succeeded; reverts to idle shortly
    Saved { version: FormVersion },
    /// Last write failed; retried on the next save cycle
    Error { message: String },
}

/// Coarse state without payloads, used for transition rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveState {
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    /// Coarse state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SaveState {
        match self {
            Self::Idle => SaveState::Idle,
            Self::Saving => SaveState::Saving,
            Self::Saved { .. } => SaveState::Saved,
            Self::Error { .. } => SaveState::Error,
        }
    }

    /// True while a write is in flight
    #[inline]
    #[must_use]
    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }

    /// Failure message, if the last write failed
    #[inline]
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Saving => f.write_str("saving"),
            Self::Saved { version } => write!(f, "saved (v{version})"),
            Self::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SaveState) -> &'static [SaveState] {
    use SaveState::{Error, Idle, Saved, Saving};
    match from {
        Idle => &[Saving],
        Saving => &[Saved, Error],
        Saved => &[Idle, Saving],
        Error => &[Idle, Saving],
    }
}

/// Validate a status transition
///
/// # Errors
/// `StatusError` if `to` is not reachable from `from`
pub fn validate_transition(from: &SaveStatus, to: &SaveStatus) -> Result<(), StatusError> {
    if allowed_transitions(from.state()).contains(&to.state()) {
        Ok(())
    } else {
        Err(StatusError {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

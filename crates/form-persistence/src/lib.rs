//! Formwright Persistence
//!
//! Durable storage for form documents and submissions.
//!
//! # Components
//!
//! - [`AutoSaver`]: debounced, single-flight document writes with an
//!   observable [`SaveStatus`]
//! - [`DocumentStore`] / [`SubmissionStore`]: async storage seams with
//!   in-memory implementations
//! - [`SubmissionRecorder`]: partial and complete submission writes,
//!   snapshotting the published document on first write
//! - [`SubmissionFeed`]: explicitly owned change-notification connection

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod autosave;
mod error;
mod feed;
mod recorder;
pub mod status;
mod store;
mod submission;

pub use autosave::{AutoSaveConfig, AutoSaver};
pub use error::{PersistenceError, StatusError, SubmissionError};
pub use feed::{FeedError, FeedSubscription, SubmissionEvent, SubmissionEventKind, SubmissionFeed};
pub use recorder::SubmissionRecorder;
pub use status::SaveStatus;
pub use store::{DocumentStore, FormVersion, MemoryDocumentStore, StoredDocument};
pub use submission::{FormSubmission, MemorySubmissionStore, SubmissionId, SubmissionStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

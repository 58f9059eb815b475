//! Submission records
//!
//! A submission is created on the first write of a respondent's session,
//! carries a byte-for-byte snapshot of the document it was answered
//! against, and becomes read-only once complete.

use crate::error::PersistenceError;
use crate::store::FormVersion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use form_model::{EncodedDocument, FormDocument, FormId};
use form_validation::Answers;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a submission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Generate new random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One respondent's answers to a form (storage-level record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub data: Answers,
    pub is_complete: bool,
    pub session_id: String,
    pub last_section_index: usize,
    pub total_sections: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_version: Option<FormVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_content_snapshot: Option<EncodedDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormSubmission {
    /// Fresh, empty, incomplete record
    #[must_use]
    pub fn new(form_id: FormId, session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SubmissionId::new(),
            form_id,
            data: Answers::new(),
            is_complete: false,
            session_id: session_id.into(),
            last_section_index: 0,
            total_sections: 0,
            form_version: None,
            form_content_snapshot: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the snapshot this submission is interpreted against
    ///
    /// # Errors
    /// `Corrupt` if the snapshot bytes do not decode
    pub fn snapshot(&self) -> Result<Option<FormDocument>, PersistenceError> {
        self.form_content_snapshot
            .as_ref()
            .map(|encoded| encoded.decode().map_err(PersistenceError::from))
            .transpose()
    }
}

/// Backing store for submission records
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Record for a respondent session, if one exists
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn find_by_session(
        &self,
        form_id: &FormId,
        session_id: &str,
    ) -> Result<Option<FormSubmission>, PersistenceError>;

    /// Insert or replace the record of `(form_id, session_id)`
    ///
    /// A session has at most one record; a second record for the same
    /// session replaces the first (last write wins).
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn upsert(&self, submission: &FormSubmission) -> Result<(), PersistenceError>;

    /// Record by id
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn get(&self, id: SubmissionId) -> Result<Option<FormSubmission>, PersistenceError>;

    /// Every record of a form, oldest first
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn list(&self, form_id: &FormId) -> Result<Vec<FormSubmission>, PersistenceError>;
}

type SessionKey = (FormId, String);

/// In-memory [`SubmissionStore`] keyed by respondent session
#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    records: DashMap<SessionKey, FormSubmission>,
}

impl MemorySubmissionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record was written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn find_by_session(
        &self,
        form_id: &FormId,
        session_id: &str,
    ) -> Result<Option<FormSubmission>, PersistenceError> {
        let key = (form_id.clone(), session_id.to_string());
        Ok(self.records.get(&key).map(|r| r.value().clone()))
    }

    async fn upsert(&self, submission: &FormSubmission) -> Result<(), PersistenceError> {
        let key = (submission.form_id.clone(), submission.session_id.clone());
        if let Some(replaced) = self.records.insert(key, submission.clone()) {
            if replaced.id != submission.id {
                tracing::warn!(
                    form_id = %submission.form_id,
                    replaced = %replaced.id,
                    kept = %submission.id,
                    "Concurrent first writes for one session, keeping the last"
                );
            }
        }
        Ok(())
    }

    async fn get(&self, id: SubmissionId) -> Result<Option<FormSubmission>, PersistenceError> {
        Ok(self
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.value().clone()))
    }

    async fn list(&self, form_id: &FormId) -> Result<Vec<FormSubmission>, PersistenceError> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| &r.form_id == form_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

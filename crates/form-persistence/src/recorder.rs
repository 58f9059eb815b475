//! Submission recording with snapshotting
//!
//! The first write of a session copies the currently stored document into
//! the record byte-for-byte, together with its version. Every later write
//! of that session is interpreted against the snapshot, never against the
//! live document, so builder edits made after a respondent started do not
//! change how their answers are read.
//!
//! Writes of one session are not serialized against each other. Stores
//! keep a single record per `(form, session)`, so two racing first writes
//! end with the last one winning.

use crate::error::SubmissionError;
use crate::feed::{SubmissionEvent, SubmissionEventKind, SubmissionFeed};
use crate::store::DocumentStore;
use crate::submission::{FormSubmission, SubmissionStore};
use crate::PersistenceError;
use chrono::Utc;
use form_model::FormId;
use form_validation::{check_answer_keys, validate_submission, Answers, ValidationError};
use std::sync::Arc;

/// Writes partial and complete submissions
pub struct SubmissionRecorder {
    documents: Arc<dyn DocumentStore>,
    submissions: Arc<dyn SubmissionStore>,
    feed: Option<Arc<SubmissionFeed>>,
}

impl SubmissionRecorder {
    /// Create recorder over the given stores
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, submissions: Arc<dyn SubmissionStore>) -> Self {
        Self {
            documents,
            submissions,
            feed: None,
        }
    }

    /// Publish every write on `feed`
    #[must_use]
    pub fn with_feed(mut self, feed: Arc<SubmissionFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Save progress without validation
    ///
    /// # Errors
    /// `UnknownAnswerField`, `AlreadyComplete`, or a store failure
    pub async fn save_partial(
        &self,
        form_id: &FormId,
        session_id: &str,
        answers: &Answers,
        last_section_index: usize,
    ) -> Result<FormSubmission, SubmissionError> {
        self.write(form_id, session_id, answers, last_section_index, false)
            .await
    }

    /// Finalize the submission
    ///
    /// Answers are merged with earlier partial saves and the result must
    /// pass validation against the snapshot.
    ///
    /// # Errors
    /// `Invalid` with the per-field result, `UnknownAnswerField`,
    /// `AlreadyComplete`, or a store failure
    pub async fn complete(
        &self,
        form_id: &FormId,
        session_id: &str,
        answers: &Answers,
        last_section_index: usize,
    ) -> Result<FormSubmission, SubmissionError> {
        self.write(form_id, session_id, answers, last_section_index, true)
            .await
    }

    async fn write(
        &self,
        form_id: &FormId,
        session_id: &str,
        answers: &Answers,
        last_section_index: usize,
        finalize: bool,
    ) -> Result<FormSubmission, SubmissionError> {
        let existing = self.submissions.find_by_session(form_id, session_id).await?;
        if let Some(record) = existing.as_ref().filter(|r| r.is_complete) {
            return Err(SubmissionError::AlreadyComplete(record.id));
        }

        let is_new = existing.is_none();
        let mut record =
            existing.unwrap_or_else(|| FormSubmission::new(form_id.clone(), session_id));

        if record.form_content_snapshot.is_none() {
            let stored = self
                .documents
                .load_document(form_id)
                .await?
                .ok_or_else(|| PersistenceError::FormNotFound(form_id.clone()))?;
            tracing::debug!(form_id = %form_id, version = %stored.version, "Snapshotting document");
            record.form_content_snapshot = Some(stored.document);
            record.form_version = Some(stored.version);
        }
        let document = record
            .snapshot()?
            .ok_or_else(|| PersistenceError::Corrupt("missing snapshot".to_string()))?;

        check_answer_keys(&document, answers).map_err(|e| match e {
            ValidationError::UnknownAnswerFields(ids) => SubmissionError::UnknownAnswerField(ids),
            other => SubmissionError::Persistence(PersistenceError::Corrupt(other.to_string())),
        })?;

        let mut data = record.data.clone();
        data.extend(answers.iter().map(|(k, v)| (k.clone(), v.clone())));

        if finalize {
            let result = validate_submission(&document, &data);
            if !result.is_acceptable() {
                tracing::info!(
                    form_id = %form_id,
                    failed = result.failed().count(),
                    "Submission rejected"
                );
                return Err(SubmissionError::Invalid(result));
            }
        }

        record.data = data;
        record.is_complete = finalize;
        record.last_section_index = last_section_index;
        record.total_sections = document.section_count();
        record.updated_at = Utc::now();
        self.submissions.upsert(&record).await?;

        let kind = if finalize {
            SubmissionEventKind::Completed
        } else if is_new {
            SubmissionEventKind::Created
        } else {
            SubmissionEventKind::Updated
        };
        tracing::info!(
            form_id = %form_id,
            submission_id = %record.id,
            kind = ?kind,
            "Recorded submission"
        );
        if let Some(feed) = &self.feed {
            feed.publish(SubmissionEvent {
                kind,
                submission: record.clone(),
            });
        }

        Ok(record)
    }
}

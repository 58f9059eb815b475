//! Document storage
//!
//! One durable record per form holds the complete encoded document and a
//! version counter that starts at 1 and increments on every save.

use crate::error::PersistenceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use form_model::{EncodedDocument, FormDocument, FormId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Monotonic per-form document version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormVersion(u64);

impl FormVersion {
    /// Version of the first persisted document
    pub const FIRST: Self = Self(1);

    /// Wrap a raw version number
    #[inline]
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Following version
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw version number
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable record of a form's document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub document: EncodedDocument,
    pub version: FormVersion,
    pub saved_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Decode the stored bytes
    ///
    /// # Errors
    /// `Corrupt` if the bytes do not decode to a well-formed document
    pub fn decode(&self) -> Result<FormDocument, PersistenceError> {
        Ok(self.document.decode()?)
    }
}

/// Backing store for form documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist the complete document, returning its new version
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn save_document(
        &self,
        form_id: &FormId,
        document: &EncodedDocument,
    ) -> Result<FormVersion, PersistenceError>;

    /// Load the current document, if one was ever saved
    ///
    /// # Errors
    /// `Failure` on transient I/O errors
    async fn load_document(&self, form_id: &FormId)
        -> Result<Option<StoredDocument>, PersistenceError>;
}

/// In-memory [`DocumentStore`]
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: DashMap<FormId, StoredDocument>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of successful writes (all forms)
    #[inline]
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current record of a form
    #[must_use]
    pub fn get(&self, form_id: &FormId) -> Option<StoredDocument> {
        self.records.get(form_id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save_document(
        &self,
        form_id: &FormId,
        document: &EncodedDocument,
    ) -> Result<FormVersion, PersistenceError> {
        let entry = self
            .records
            .entry(form_id.clone())
            .and_modify(|record| {
                record.version = record.version.next();
                record.document = document.clone();
                record.saved_at = Utc::now();
            })
            .or_insert_with(|| StoredDocument {
                document: document.clone(),
                version: FormVersion::FIRST,
                saved_at: Utc::now(),
            });
        let version = entry.version;
        drop(entry);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(version)
    }

    async fn load_document(
        &self,
        form_id: &FormId,
    ) -> Result<Option<StoredDocument>, PersistenceError> {
        Ok(self.get(form_id))
    }
}

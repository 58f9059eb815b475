//! Debounced persistence pipeline
//!
//! [`AutoSaver`] owns a background task that turns document mutations into
//! durable writes:
//!
//! - A write starts `debounce` after the last mutation, or immediately on
//!   [`AutoSaver::save_now`], which cancels the pending timer
//! - A document whose content hash equals the last persisted one is not
//!   written and the status does not change
//! - At most one write is in flight; a mutation arriving meanwhile re-arms
//!   the debounce once the write settles, and a manual save request runs
//!   right after it
//! - `Saved` reverts to `Idle` after `saved_reset` unless another write
//!   started
//! - A failed write moves to `Error`; the document stays in memory and the
//!   next save cycle tries again. If the document is reverted to the
//!   persisted content instead, the status returns to `Idle`
//! - A stopped pipeline reports `Idle`, or `Error` if its final flush failed
//! - The first document observed is taken as already persisted

use crate::error::PersistenceError;
use crate::status::{validate_transition, SaveStatus};
use crate::store::{DocumentStore, FormVersion};
use form_model::{ContentHash, FormDocument, FormId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Pipeline timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period after the last mutation before a write starts
    pub debounce_ms: u64,
    /// How long `Saved` is shown before reverting to `Idle`
    pub saved_reset_ms: u64,
}

impl AutoSaveConfig {
    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Saved-to-idle delay
    #[inline]
    #[must_use]
    pub fn saved_reset(&self) -> Duration {
        Duration::from_millis(self.saved_reset_ms)
    }

    /// With debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// With saved-to-idle delay
    #[inline]
    #[must_use]
    pub fn with_saved_reset_ms(mut self, saved_reset_ms: u64) -> Self {
        self.saved_reset_ms = saved_reset_ms;
        self
    }
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1500,
            saved_reset_ms: 2000,
        }
    }
}

enum Signal {
    Mutation(FormDocument),
    SaveNow,
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the persistence pipeline of one form
#[derive(Debug)]
pub struct AutoSaver {
    form_id: FormId,
    signals: mpsc::UnboundedSender<Signal>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mutation(_) => f.write_str("Mutation"),
            Self::SaveNow => f.write_str("SaveNow"),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

impl AutoSaver {
    /// Start the pipeline task for `form_id`
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(form_id: FormId, store: Arc<dyn DocumentStore>, config: AutoSaveConfig) -> Self {
        let (signals, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);
        let pipeline = Pipeline::new(form_id.clone(), store, config, status_tx);
        let task = tokio::spawn(pipeline.run(rx));
        tracing::debug!(form_id = %form_id, "Auto-saver attached");
        Self {
            form_id,
            signals,
            status,
            task,
        }
    }

    /// Form this pipeline persists
    #[inline]
    #[must_use]
    pub fn form_id(&self) -> &FormId {
        &self.form_id
    }

    /// Report the latest document (the first call sets the baseline)
    pub fn on_mutation(&self, document: &FormDocument) {
        self.send(Signal::Mutation(document.clone()));
    }

    /// Request an immediate save, cancelling the pending debounce
    pub fn save_now(&self) {
        self.send(Signal::SaveNow);
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Status observable
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Wait for the in-flight write, flush unsaved changes once, then stop
    pub async fn shutdown(self) {
        let (ack, done) = oneshot::channel();
        self.send(Signal::Shutdown(ack));
        let _ = done.await;
        if let Err(e) = self.task.await {
            tracing::error!(form_id = %self.form_id, error = %e, "Auto-saver task failed");
        }
    }

    fn send(&self, signal: Signal) {
        if self.signals.send(signal).is_err() {
            tracing::warn!(form_id = %self.form_id, "Auto-saver is no longer running");
        }
    }
}

type SaveOutcome = (ContentHash, Result<FormVersion, PersistenceError>);
type InFlight = Pin<Box<dyn Future<Output = SaveOutcome> + Send>>;

enum Event {
    Signal(Signal),
    Closed,
    Settled(SaveOutcome),
    DebounceElapsed,
    ResetElapsed,
}

struct Pipeline {
    form_id: FormId,
    store: Arc<dyn DocumentStore>,
    config: AutoSaveConfig,
    status: watch::Sender<SaveStatus>,
    latest: Option<FormDocument>,
    persisted: Option<ContentHash>,
    in_flight: Option<InFlight>,
    debounce_at: Option<Instant>,
    reset_at: Option<Instant>,
    mutated_in_flight: bool,
    save_requested: bool,
    closing: bool,
    close_ack: Option<oneshot::Sender<()>>,
    flush_on_close: bool,
}

impl Pipeline {
    fn new(
        form_id: FormId,
        store: Arc<dyn DocumentStore>,
        config: AutoSaveConfig,
        status: watch::Sender<SaveStatus>,
    ) -> Self {
        Self {
            form_id,
            store,
            config,
            status,
            latest: None,
            persisted: None,
            in_flight: None,
            debounce_at: None,
            reset_at: None,
            mutated_in_flight: false,
            save_requested: false,
            closing: false,
            close_ack: None,
            flush_on_close: false,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Signal>) {
        loop {
            let accepting = !self.closing;
            let idle = self.in_flight.is_none();
            let event = tokio::select! {
                signal = rx.recv(), if accepting => match signal {
                    Some(signal) => Event::Signal(signal),
                    None => Event::Closed,
                },
                outcome = settle(&mut self.in_flight) => Event::Settled(outcome),
                () = wait_until(self.debounce_at), if idle => Event::DebounceElapsed,
                () = wait_until(self.reset_at) => Event::ResetElapsed,
            };

            match event {
                Event::Signal(Signal::Mutation(document)) => self.on_mutation(document),
                Event::Signal(Signal::SaveNow) => {
                    self.debounce_at = None;
                    if self.in_flight.is_some() {
                        self.save_requested = true;
                    } else {
                        self.start_save();
                    }
                }
                Event::Signal(Signal::Shutdown(ack)) => self.begin_close(Some(ack)),
                Event::Closed => self.begin_close(None),
                Event::Settled(outcome) => self.on_settled(outcome),
                Event::DebounceElapsed => {
                    self.debounce_at = None;
                    self.start_save();
                }
                Event::ResetElapsed => {
                    self.reset_at = None;
                    if matches!(*self.status.borrow(), SaveStatus::Saved { .. }) {
                        self.transition(SaveStatus::Idle);
                    }
                }
            }

            if self.closing && self.in_flight.is_none() {
                if self.flush_on_close {
                    self.flush_on_close = false;
                    if self.start_save() {
                        continue;
                    }
                }
                break;
            }
        }

        if matches!(*self.status.borrow(), SaveStatus::Saved { .. }) {
            self.transition(SaveStatus::Idle);
        }
        if let Some(ack) = self.close_ack.take() {
            let _ = ack.send(());
        }
        tracing::debug!(form_id = %self.form_id, "Auto-saver stopped");
    }

    fn on_mutation(&mut self, document: FormDocument) {
        if self.latest.is_none() && self.persisted.is_none() {
            match document.content_hash() {
                Ok(hash) => self.persisted = Some(hash),
                Err(e) => tracing::warn!(form_id = %self.form_id, error = %e, "Baseline not hashable"),
            }
            self.latest = Some(document);
            return;
        }

        self.latest = Some(document);
        self.debounce_at = Some(Instant::now() + self.config.debounce());
        if self.in_flight.is_some() {
            self.mutated_in_flight = true;
        }
    }

    fn on_settled(&mut self, (hash, result): SaveOutcome) {
        self.in_flight = None;
        match result {
            Ok(version) => {
                tracing::info!(form_id = %self.form_id, %version, "Document saved");
                self.persisted = Some(hash);
                self.transition(SaveStatus::Saved { version });
                self.reset_at = Some(Instant::now() + self.config.saved_reset());
            }
            Err(e) => {
                tracing::warn!(form_id = %self.form_id, error = %e, "Document save failed");
                self.transition(SaveStatus::Error {
                    message: e.to_string(),
                });
            }
        }

        if self.closing {
            return;
        }
        if std::mem::take(&mut self.save_requested) {
            self.mutated_in_flight = false;
            self.debounce_at = None;
            self.start_save();
        } else if std::mem::take(&mut self.mutated_in_flight) {
            self.debounce_at = Some(Instant::now() + self.config.debounce());
        }
    }

    fn begin_close(&mut self, ack: Option<oneshot::Sender<()>>) {
        self.debounce_at = None;
        self.save_requested = false;
        self.mutated_in_flight = false;
        self.flush_on_close = true;
        self.closing = true;
        self.close_ack = ack;
    }

    /// Start a write of the latest document unless it is already persisted
    fn start_save(&mut self) -> bool {
        let Some(document) = &self.latest else {
            return false;
        };
        let encoded = match document.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(form_id = %self.form_id, error = %e, "Document not encodable");
                return false;
            }
        };
        let hash = encoded.content_hash();
        if self.persisted == Some(hash) {
            tracing::debug!(form_id = %self.form_id, "Document unchanged, skipping save");
            if self.status.borrow().error_message().is_some() {
                self.transition(SaveStatus::Idle);
            }
            return false;
        }

        self.reset_at = None;
        self.transition(SaveStatus::Saving);
        tracing::debug!(form_id = %self.form_id, bytes = encoded.len(), "Saving document");

        let store = Arc::clone(&self.store);
        let form_id = self.form_id.clone();
        self.in_flight = Some(Box::pin(async move {
            let result = store.save_document(&form_id, &encoded).await;
            (hash, result)
        }));
        true
    }

    fn transition(&self, next: SaveStatus) {
        let current = self.status.borrow().clone();
        if let Err(e) = validate_transition(&current, &next) {
            tracing::error!(form_id = %self.form_id, error = %e, "Rejected status transition");
            return;
        }
        self.status.send_replace(next);
    }
}

async fn settle(in_flight: &mut Option<InFlight>) -> SaveOutcome {
    match in_flight {
        Some(write) => write.await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

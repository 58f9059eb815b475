//! Submission change feed
//!
//! An explicitly constructed broadcast connection. Whoever creates the
//! feed owns its lifecycle: subscribers see events until
//! [`SubmissionFeed::disconnect`] is called, after which their streams end.

use crate::submission::FormSubmission;
use form_model::FormId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What happened to a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEventKind {
    Created,
    Updated,
    Completed,
}

/// One change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEvent {
    pub kind: SubmissionEventKind,
    pub submission: FormSubmission,
}

impl SubmissionEvent {
    /// Form the submission belongs to
    #[inline]
    #[must_use]
    pub fn form_id(&self) -> &FormId {
        &self.submission.form_id
    }
}

/// Feed errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The feed has been disconnected by its owner
    #[error("submission feed is disconnected")]
    Disconnected,
}

/// Owned broadcast connection for submission events
#[derive(Debug)]
pub struct SubmissionFeed {
    sender: RwLock<Option<broadcast::Sender<SubmissionEvent>>>,
}

impl SubmissionFeed {
    /// Open a feed buffering up to `capacity` events per subscriber
    #[must_use]
    pub fn connect(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: RwLock::new(Some(sender)),
        }
    }

    /// Deliver an event to every live subscriber
    ///
    /// Returns the number of subscribers reached; zero once disconnected.
    pub fn publish(&self, event: SubmissionEvent) -> usize {
        self.sender
            .read()
            .as_ref()
            .and_then(|sender| sender.send(event).ok())
            .unwrap_or(0)
    }

    /// Subscribe to the events of one form
    ///
    /// # Errors
    /// `Disconnected` after [`disconnect`](Self::disconnect)
    pub fn subscribe(&self, form_id: FormId) -> Result<FeedSubscription, FeedError> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(FeedError::Disconnected)?;
        Ok(FeedSubscription {
            form_id,
            receiver: sender.subscribe(),
        })
    }

    /// Close the connection; open subscriptions drain and then end
    pub fn disconnect(&self) {
        if self.sender.write().take().is_some() {
            tracing::debug!("Submission feed disconnected");
        }
    }

    /// True until [`disconnect`](Self::disconnect)
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.sender.read().is_some()
    }
}

/// Subscription filtered to one form
#[derive(Debug)]
pub struct FeedSubscription {
    form_id: FormId,
    receiver: broadcast::Receiver<SubmissionEvent>,
}

impl FeedSubscription {
    /// Form this subscription listens to
    #[inline]
    #[must_use]
    pub fn form_id(&self) -> &FormId {
        &self.form_id
    }

    /// Next event for this form, or `None` once the feed is disconnected
    pub async fn next(&mut self) -> Option<SubmissionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.form_id() == &self.form_id => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(form_id = %self.form_id, missed, "Submission subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

//! Completion notifier
//!
//! One-shot signal that a page has finished. It fires at most once per
//! session; after it fires, or after [`CompletionNotifier::disarm`], every
//! further call is a no-op. A host that never sees the event must treat the
//! session as still active.
//!
//! There is a single listener slot, claimed by the first registration.
//! Channel subscribers are unlimited and each receives the event.

use crate::types::PageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Payload delivered when a page completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub page: PageId,
    pub completed_at: DateTime<Utc>,
}

type Listener = Box<dyn FnOnce(PageId) + Send>;

/// Single-listener, single-fire completion signal
#[derive(Default)]
pub struct CompletionNotifier {
    listener: Option<Listener>,
    subscribers: Vec<oneshot::Sender<CompletionEvent>>,
    fired: bool,
    disarmed: bool,
}

impl CompletionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the listener. Returns false, keeping the existing listener,
    /// if one is already registered or the notifier is spent.
    pub fn on_completed<F>(&mut self, listener: F) -> bool
    where
        F: FnOnce(PageId) + Send + 'static,
    {
        if self.listener.is_some() {
            warn!("Completion listener already registered, ignoring");
            return false;
        }
        if self.is_spent() {
            debug!("Completion listener registered after the event, ignoring");
            return false;
        }
        self.listener = Some(Box::new(listener));
        true
    }

    /// Receive the completion event on a channel.
    ///
    /// The sender is dropped without a value if the session is aborted.
    pub fn subscribe(&mut self) -> oneshot::Receiver<CompletionEvent> {
        let (tx, rx) = oneshot::channel();
        if !self.is_spent() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Whether the event has been delivered
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    fn is_spent(&self) -> bool {
        self.fired || self.disarmed
    }

    /// Deliver the event. Returns false if it already fired or was disarmed.
    pub fn notify(&mut self, page: PageId) -> bool {
        if self.is_spent() {
            debug!(page = %page, "Completion already signalled, ignoring");
            return false;
        }
        self.fired = true;

        if let Some(listener) = self.listener.take() {
            listener(page);
        }
        let event = CompletionEvent {
            page,
            completed_at: Utc::now(),
        };
        for tx in self.subscribers.drain(..) {
            let _ = tx.send(event);
        }
        true
    }

    /// Drop listeners without notifying them
    pub fn disarm(&mut self) {
        self.disarmed = true;
        self.listener = None;
        self.subscribers.clear();
    }
}

impl std::fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("has_listener", &self.listener.is_some())
            .field("subscribers", &self.subscribers.len())
            .field("fired", &self.fired)
            .field("disarmed", &self.disarmed)
            .finish()
    }
}

//! Page runner - drives a sequencer in real time
//!
//! One tokio task per page. The task owns the sequencer outright and
//! multiplexes, in a single biased `select!`:
//! - abort requests from the [`PageHandle`]
//! - the one-second tick
//! - the earliest pending one-shot timer
//!
//! so every state mutation runs strictly one at a time and no lock guards
//! the sequencer. After each event the runner picks up newly armed timers
//! and drops the ones the sequencer cancelled, before handling anything
//! else. Snapshots are published on a `watch` channel.

use crate::{
    sequencer::{PlaybackSequencer, SequencerSnapshot, TimerHandle},
    types::*,
    Error, Result,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, Instrument};

/// Message from the host to a running page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Abort,
}

/// Handle to a spawned page session
#[derive(Debug)]
pub struct PageHandle {
    id: SessionId,
    page: PageId,
    control_tx: mpsc::Sender<Control>,
    state_rx: watch::Receiver<SequencerSnapshot>,
    join: JoinHandle<PageOutcome>,
}

impl PageHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    /// Subscribe to sequencer snapshots
    pub fn subscribe_state(&self) -> watch::Receiver<SequencerSnapshot> {
        self.state_rx.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SequencerSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Ask the page to stop without completing. Idempotent.
    pub async fn abort(&self) {
        if self.control_tx.send(Control::Abort).await.is_err() {
            debug!(page = %self.page, "Abort after the session ended");
        }
    }

    /// Wait for the session to end
    pub async fn wait(self) -> Result<PageOutcome> {
        let PageHandle { join, control_tx, .. } = self;
        let outcome = join
            .await
            .map_err(|e| Error::Internal(format!("page task failed: {}", e)));
        drop(control_tx);
        outcome
    }
}

/// Real-time driver for one [`PlaybackSequencer`]
pub struct PageRunner {
    id: SessionId,
    sequencer: PlaybackSequencer,
    timers: Vec<(Instant, TimerHandle)>,
    control_rx: mpsc::Receiver<Control>,
    state_tx: watch::Sender<SequencerSnapshot>,
}

impl PageRunner {
    /// Spawn the session on the current tokio runtime and start it
    pub fn spawn(sequencer: PlaybackSequencer) -> PageHandle {
        let id = SessionId::new();
        let page = sequencer.page();
        let (control_tx, control_rx) = mpsc::channel(4);
        let (state_tx, state_rx) = watch::channel(sequencer.snapshot());

        let runner = PageRunner {
            id,
            sequencer,
            timers: Vec::new(),
            control_rx,
            state_tx,
        };
        let span = info_span!("page_session", session_id = %id, page = %page);
        let join = tokio::spawn(runner.run().instrument(span));

        PageHandle {
            id,
            page,
            control_tx,
            state_rx,
            join,
        }
    }

    async fn run(mut self) -> PageOutcome {
        let started_at = Instant::now();
        let mut ticker = time::interval_at(started_at + TICK_INTERVAL, TICK_INTERVAL);
        let mut control_open = true;

        self.sequencer.start();
        self.sync_timers(started_at);
        self.publish();

        while !self.sequencer.is_completed() {
            let next_deadline = self.timers.iter().map(|(at, _)| *at).min();

            tokio::select! {
                biased;

                control = self.control_rx.recv(), if control_open => match control {
                    Some(Control::Abort) => {
                        self.sequencer.abort();
                    }
                    None => {
                        debug!("Page handle dropped, running to completion");
                        control_open = false;
                    }
                },
                _ = ticker.tick() => {
                    self.sequencer.tick();
                }
                _ = sleep_until(next_deadline) => {
                    self.fire_due(Instant::now());
                }
            }

            self.sync_timers(Instant::now());
            self.publish();
        }

        let outcome = self
            .sequencer
            .outcome()
            .unwrap_or(PageOutcome::Aborted(self.sequencer.page()));
        info!(
            session_id = %self.id,
            outcome = ?outcome,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Page session finished"
        );
        outcome
    }

    /// Fire every timer whose deadline has passed, earliest first
    fn fire_due(&mut self, now: Instant) {
        let mut due: Vec<(Instant, TimerHandle)> = Vec::new();
        self.timers.retain(|(at, handle)| {
            if *at <= now {
                due.push((*at, *handle));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);

        for (_, handle) in due {
            // Earlier timers in this batch may have cancelled later ones
            if !self.sequencer.fire(handle) {
                debug!(timer = ?handle.kind, "Timer discarded");
            }
        }
    }

    fn sync_timers(&mut self, now: Instant) {
        for request in self.sequencer.drain_timer_requests() {
            self.timers.push((now + request.delay, request.handle));
        }
        let sequencer = &self.sequencer;
        self.timers.retain(|(_, handle)| sequencer.is_armed(handle));
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.sequencer.snapshot());
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::presenter::{NullPresenter, PresenterCommand, RecordingPresenter};
    use std::time::Duration;

    fn config(countdown: u32) -> SessionConfig {
        SessionConfig {
            countdown_seconds: countdown,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_completion() {
        let presenter = RecordingPresenter::new();
        let slots = vec![VideoSlot::new(1, 5), VideoSlot::new(2, 10), VideoSlot::new(3, 15)];
        let mut sequencer = PlaybackSequencer::new(PageId(9), config(3), slots, presenter.clone()).unwrap();
        let completion = sequencer.subscribe_completion();

        let started = Instant::now();
        let handle = PageRunner::spawn(sequencer);
        let outcome = handle.wait().await.unwrap();

        assert_eq!(outcome, PageOutcome::Completed(PageId(9)));
        assert_eq!(completion.await.unwrap().page, PageId(9));

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(33), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(35), "elapsed {:?}", elapsed);

        let focus: Vec<_> = presenter
            .focus_changes()
            .into_iter()
            .filter(|c| matches!(c, PresenterCommand::Focus { .. }))
            .collect();
        assert_eq!(focus.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_mid_focus() {
        let presenter = RecordingPresenter::new();
        let slots = vec![VideoSlot::new(1, 5), VideoSlot::new(2, 20), VideoSlot::new(3, 5)];
        let mut sequencer = PlaybackSequencer::new(PageId(4), config(2), slots, presenter.clone()).unwrap();
        let completion = sequencer.subscribe_completion();

        let handle = PageRunner::spawn(sequencer);
        let mut state = handle.subscribe_state();
        while state.borrow_and_update().phase != Phase::Focusing(1) {
            state.changed().await.unwrap();
        }

        handle.abort().await;
        let commands_at_abort = presenter.focus_changes().len();
        let outcome = handle.wait().await.unwrap();

        assert_eq!(outcome, PageOutcome::Aborted(PageId(4)));
        assert!(completion.await.is_err());

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(presenter.focus_changes().len(), commands_at_abort);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_completes() {
        let sequencer = PlaybackSequencer::new(PageId(2), config(1), Vec::new(), NullPresenter).unwrap();
        let handle = PageRunner::spawn(sequencer);

        assert_eq!(handle.wait().await.unwrap(), PageOutcome::Completed(PageId(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_run_independently() {
        let first = PlaybackSequencer::new(PageId(1), config(1), vec![VideoSlot::new(1, 3)], NullPresenter).unwrap();
        let second = PlaybackSequencer::new(PageId(2), config(1), vec![VideoSlot::new(1, 30)], NullPresenter).unwrap();

        let first = PageRunner::spawn(first);
        let second = PageRunner::spawn(second);
        assert_ne!(first.id(), second.id());

        second.abort().await;
        assert_eq!(first.wait().await.unwrap(), PageOutcome::Completed(PageId(1)));
        assert_eq!(second.wait().await.unwrap(), PageOutcome::Aborted(PageId(2)));
    }
}

//! Playback sequencer - the phase state machine for one page
//!
//! Owns:
//! - The phase (countdown, settle, focus rotation, completed)
//! - The slot controllers and which of them is focused
//! - The one-shot timers that move the page along
//! - The completion notifier
//!
//! The sequencer never sleeps. A driver (the async [`PageRunner`] or the
//! deterministic simulation) pumps [`PlaybackSequencer::tick`] once per
//! second, drains the timers the sequencer arms with
//! [`PlaybackSequencer::drain_timer_requests`], and hands them back through
//! [`PlaybackSequencer::fire`] when they elapse. Every phase change bumps a
//! generation counter; a timer is honored only if it was armed in the
//! current generation and is still armed, so the rotation timer and the
//! per-second countdown can both try to end a focus window and only the
//! first one wins.
//!
//! [`PageRunner`]: crate::runner::PageRunner

use crate::{
    config::SessionConfig,
    notifier::{CompletionEvent, CompletionNotifier},
    presenter::Presenter,
    slot::{SlotController, SlotStatus},
    types::*,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// What a one-shot timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "timer", content = "slot", rename_all = "snake_case")]
pub enum TimerKind {
    /// Settle delay after the countdown
    Settle,
    /// End of the focus window of the slot at this index
    Rotation(usize),
    /// Safety net armed next to the last slot's rotation timer
    FallbackCompletion,
}

/// A timer as armed in a specific generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    pub kind: TimerKind,
    pub generation: u64,
}

/// Request to the driver to call [`PlaybackSequencer::fire`] after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub handle: TimerHandle,
    pub delay: Duration,
}

/// Mutable sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerState {
    pub phase: Phase,
    pub countdown_remaining: u32,
    pub focus_remaining: u32,
    /// Once set, nothing else has an observable effect
    pub completed: bool,
    /// Set together with `completed` when the host stopped the page
    pub aborted: bool,
    pub generation: u64,
}

/// Read-only view of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub position: u32,
    pub title: String,
    pub status: SlotStatus,
    pub remaining: u32,
    pub label: String,
}

/// Read-only view of the whole sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    pub page: PageId,
    pub phase: Phase,
    pub countdown_remaining: u32,
    pub focus_remaining: u32,
    pub completed: bool,
    pub aborted: bool,
    pub slots: Vec<SlotSnapshot>,
}

/// Phase state machine and timer choreography for one page session
pub struct PlaybackSequencer {
    page: PageId,
    config: SessionConfig,
    slots: Vec<SlotController>,
    state: SequencerState,
    started: bool,
    armed: Vec<TimerHandle>,
    requests: Vec<TimerRequest>,
    presenter: Box<dyn Presenter>,
    notifier: CompletionNotifier,
}

impl PlaybackSequencer {
    /// Create a sequencer for `page`.
    ///
    /// Up to [`MAX_SLOTS`] slots, already in rotation order. Fewer is fine.
    /// Positions must lie in `1..=MAX_SLOTS` and the config must validate.
    pub fn new<P>(page: PageId, config: SessionConfig, slots: Vec<VideoSlot>, presenter: P) -> Result<Self>
    where
        P: Presenter + 'static,
    {
        config.validate()?;

        if slots.len() > MAX_SLOTS {
            return Err(Error::TooManySlots {
                count: slots.len(),
                max: MAX_SLOTS,
            });
        }

        let mut seen = HashSet::new();
        for slot in &slots {
            if slot.position == 0 || slot.position as usize > MAX_SLOTS {
                return Err(Error::InvalidPosition {
                    position: slot.position,
                    max: MAX_SLOTS,
                });
            }
            if !seen.insert(slot.position) {
                return Err(Error::DuplicatePosition {
                    position: slot.position,
                });
            }
        }

        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| SlotController::new(index, slot, config.default_focus_seconds))
            .collect();

        Ok(Self {
            page,
            state: SequencerState {
                phase: Phase::Countdown,
                countdown_remaining: config.countdown_seconds,
                focus_remaining: 0,
                completed: false,
                aborted: false,
                generation: 0,
            },
            config,
            slots,
            started: false,
            armed: Vec::new(),
            requests: Vec::new(),
            presenter: Box::new(presenter),
            notifier: CompletionNotifier::new(),
        })
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn slots(&self) -> &[SlotController] {
        &self.slots
    }

    /// Index of the focused slot, if any
    pub fn focused(&self) -> Option<usize> {
        self.state.phase.focused()
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.state.countdown_remaining
    }

    pub fn focus_remaining(&self) -> u32 {
        self.state.focus_remaining
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn is_aborted(&self) -> bool {
        self.state.aborted
    }

    /// Terminal outcome, once there is one
    pub fn outcome(&self) -> Option<PageOutcome> {
        match (self.state.completed, self.state.aborted) {
            (false, _) => None,
            (true, true) => Some(PageOutcome::Aborted(self.page)),
            (true, false) => Some(PageOutcome::Completed(self.page)),
        }
    }

    /// Sum of every slot's focus window in seconds
    pub fn total_focus_seconds(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.duration())).sum()
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            page: self.page,
            phase: self.state.phase,
            countdown_remaining: self.state.countdown_remaining,
            focus_remaining: self.state.focus_remaining,
            completed: self.state.completed,
            aborted: self.state.aborted,
            slots: self
                .slots
                .iter()
                .map(|s| SlotSnapshot {
                    position: s.slot().position,
                    title: s.slot().title.clone(),
                    status: s.status(),
                    remaining: s.remaining(),
                    label: s.label().to_string(),
                })
                .collect(),
        }
    }

    /// Register the completion listener. Only the first registration is kept.
    pub fn on_completed<F>(&mut self, listener: F) -> bool
    where
        F: FnOnce(PageId) + Send + 'static,
    {
        self.notifier.on_completed(listener)
    }

    /// Receive the completion event on a channel. Any number of subscribers.
    pub fn subscribe_completion(&mut self) -> oneshot::Receiver<CompletionEvent> {
        self.notifier.subscribe()
    }

    /// Timers armed in the current generation
    pub fn pending_timers(&self) -> &[TimerHandle] {
        &self.armed
    }

    pub fn is_armed(&self, handle: &TimerHandle) -> bool {
        self.armed.contains(handle)
    }

    /// Timers armed since the last drain
    pub fn drain_timer_requests(&mut self) -> Vec<TimerRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Begin the countdown. Only the first call has an effect.
    pub fn start(&mut self) -> bool {
        if self.started || self.state.completed {
            debug!(page = %self.page, "Start ignored, session already started or finished");
            return false;
        }
        self.started = true;

        info!(
            page = %self.page,
            slots = self.slots.len(),
            countdown = self.state.countdown_remaining,
            focus_total = self.total_focus_seconds(),
            "Page session started"
        );

        for slot in &self.slots {
            self.presenter.set_volume(slot.slot(), self.config.volume);
        }
        self.presenter.show_countdown(self.state.countdown_remaining);

        if self.state.countdown_remaining == 0 {
            self.enter_starting();
        }
        true
    }

    /// Advance the active phase by one second
    pub fn tick(&mut self) {
        if self.state.completed || !self.started {
            return;
        }

        match self.state.phase {
            Phase::Countdown => {
                let remaining = self.state.countdown_remaining.saturating_sub(1);
                self.state.countdown_remaining = remaining;
                self.presenter.show_countdown(remaining);
                debug!(page = %self.page, remaining, "Countdown tick");

                if remaining == 0 {
                    info!(page = %self.page, "Countdown finished");
                    self.enter_starting();
                }
            }
            Phase::Focusing(index) => {
                let remaining = self.slots[index].remaining().saturating_sub(1);
                self.slots[index].set_remaining(remaining, self.presenter.as_mut());
                self.state.focus_remaining = remaining;
                debug!(page = %self.page, slot = index, remaining, "Focus tick");

                if remaining == 0 {
                    info!(page = %self.page, slot = index, "Focus time used up");
                    self.advance(index);
                }
            }
            Phase::Starting | Phase::Completed => {}
        }
    }

    /// Handle an elapsed one-shot timer. Returns false if it was stale.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        if self.state.completed {
            debug!(page = %self.page, timer = ?handle.kind, "Timer fired after completion, ignoring");
            return false;
        }
        if handle.generation != self.state.generation || !self.armed.contains(&handle) {
            debug!(
                page = %self.page,
                timer = ?handle.kind,
                generation = handle.generation,
                current = self.state.generation,
                "Stale timer, ignoring"
            );
            return false;
        }
        self.armed.retain(|armed| *armed != handle);

        match (handle.kind, self.state.phase) {
            (TimerKind::Settle, Phase::Starting) => self.begin_rotation(),
            (TimerKind::Rotation(index), Phase::Focusing(current)) if index == current => {
                info!(page = %self.page, slot = index, "Rotation timer elapsed");
                self.advance(index);
            }
            (TimerKind::FallbackCompletion, Phase::Focusing(index)) => {
                warn!(page = %self.page, slot = index, "Fallback completion timer elapsed");
                self.complete();
            }
            (kind, phase) => {
                debug!(page = %self.page, timer = ?kind, phase = %phase, "Timer does not apply to phase");
                return false;
            }
        }
        true
    }

    /// Stop everything without signalling completion. Returns false if already finished.
    pub fn abort(&mut self) -> bool {
        if self.state.completed {
            debug!(page = %self.page, "Abort ignored, session already finished");
            return false;
        }

        self.cancel_timers();
        for slot in &mut self.slots {
            slot.halt();
        }
        self.state.phase = Phase::Completed;
        self.state.completed = true;
        self.state.aborted = true;
        self.notifier.disarm();

        info!(page = %self.page, "Page session aborted");
        true
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        let handle = TimerHandle {
            kind,
            generation: self.state.generation,
        };
        debug!(page = %self.page, timer = ?kind, delay_ms = delay.as_millis() as u64, "Timer armed");
        self.armed.push(handle);
        self.requests.push(TimerRequest { handle, delay });
    }

    /// Invalidate every outstanding timer
    fn cancel_timers(&mut self) {
        self.state.generation += 1;
        self.armed.clear();
        self.requests.clear();
    }

    fn enter_starting(&mut self) {
        self.cancel_timers();
        self.state.phase = Phase::Starting;
        self.arm(TimerKind::Settle, SETTLE_DELAY);
    }

    fn begin_rotation(&mut self) {
        if self.slots.is_empty() {
            info!(page = %self.page, "Page has no slots");
            self.complete();
            return;
        }

        for slot in &mut self.slots {
            slot.reset(self.presenter.as_mut());
        }
        self.enter_focus(0);
    }

    fn enter_focus(&mut self, index: usize) {
        self.cancel_timers();
        self.state.phase = Phase::Focusing(index);

        let duration = self.slots[index].duration();
        self.slots[index].set_remaining(duration, self.presenter.as_mut());
        self.slots[index].focus(self.presenter.as_mut());
        self.state.focus_remaining = duration;

        let window = Duration::from_secs(u64::from(duration));
        self.arm(TimerKind::Rotation(index), window);
        if index + 1 == self.slots.len() {
            self.arm(TimerKind::FallbackCompletion, window + FALLBACK_GRACE);
        }

        info!(
            page = %self.page,
            slot = index,
            position = self.slots[index].slot().position,
            duration,
            "Slot focused"
        );
    }

    fn advance(&mut self, index: usize) {
        self.slots[index].unfocus(self.presenter.as_mut());

        if index + 1 < self.slots.len() {
            self.enter_focus(index + 1);
        } else {
            self.complete();
        }
    }

    fn complete(&mut self) {
        if self.state.completed {
            return;
        }

        self.cancel_timers();
        for slot in &mut self.slots {
            slot.unfocus(self.presenter.as_mut());
        }
        self.state.phase = Phase::Completed;
        self.state.completed = true;
        self.state.focus_remaining = 0;

        info!(page = %self.page, "Page completed");
        self.notifier.notify(self.page);
    }
}

impl std::fmt::Debug for PlaybackSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSequencer")
            .field("page", &self.page)
            .field("state", &self.state)
            .field("started", &self.started)
            .field("armed", &self.armed)
            .field("notifier", &self.notifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{NullPresenter, PresenterCommand, RecordingPresenter};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(countdown: u32) -> SessionConfig {
        SessionConfig {
            countdown_seconds: countdown,
            default_focus_seconds: 60,
            ..Default::default()
        }
    }

    fn slots(durations: &[u32]) -> Vec<VideoSlot> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| VideoSlot::new(i as u32 + 1, *d))
            .collect()
    }

    fn counting(seq: &mut PlaybackSequencer) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        seq.on_completed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        calls
    }

    fn handle_for(seq: &PlaybackSequencer, kind: TimerKind) -> TimerHandle {
        *seq.pending_timers()
            .iter()
            .find(|h| h.kind == kind)
            .expect("timer should be armed")
    }

    fn ticks(seq: &mut PlaybackSequencer, n: u32) {
        for _ in 0..n {
            seq.tick();
        }
    }

    /// Run the countdown and the settle delay
    fn into_focus(seq: &mut PlaybackSequencer) {
        seq.start();
        ticks(seq, seq.countdown_remaining());
        let settle = handle_for(seq, TimerKind::Settle);
        assert!(seq.fire(settle));
    }

    #[test]
    fn test_start_only_once() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(30), slots(&[10]), NullPresenter).unwrap();
        assert!(!seq.is_started());
        assert!(seq.start());
        assert!(!seq.start());
        assert_eq!(seq.phase(), Phase::Countdown);
    }

    #[test]
    fn test_ticks_before_start_do_nothing() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(5), slots(&[10]), NullPresenter).unwrap();
        ticks(&mut seq, 10);
        assert_eq!(seq.countdown_remaining(), 5);
        assert_eq!(seq.phase(), Phase::Countdown);
    }

    #[test]
    fn test_countdown_ends_at_tick_thirty() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(30), slots(&[10]), NullPresenter).unwrap();
        seq.start();
        ticks(&mut seq, 29);
        assert_eq!(seq.phase(), Phase::Countdown);
        assert_eq!(seq.countdown_remaining(), 1);

        seq.tick();
        assert_eq!(seq.phase(), Phase::Starting);
        assert_eq!(seq.focused(), None);

        let requests = seq.drain_timer_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].handle.kind, TimerKind::Settle);
        assert_eq!(requests[0].delay, SETTLE_DELAY);
    }

    #[test]
    fn test_zero_countdown_goes_straight_to_starting() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(0), slots(&[10]), NullPresenter).unwrap();
        seq.start();
        assert_eq!(seq.phase(), Phase::Starting);
    }

    #[test]
    fn test_full_rotation_by_ticks() {
        let mut seq =
            PlaybackSequencer::new(PageId(7), config(30), slots(&[300, 600, 900]), NullPresenter).unwrap();
        let calls = counting(&mut seq);
        into_focus(&mut seq);

        assert_eq!(seq.phase(), Phase::Focusing(0));
        assert_eq!(seq.focus_remaining(), 300);

        ticks(&mut seq, 299);
        assert_eq!(seq.phase(), Phase::Focusing(0));
        seq.tick();
        assert_eq!(seq.phase(), Phase::Focusing(1));
        assert_eq!(seq.focus_remaining(), 600);

        ticks(&mut seq, 600);
        assert_eq!(seq.phase(), Phase::Focusing(2));
        assert_eq!(seq.focus_remaining(), 900);

        ticks(&mut seq, 899);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        seq.tick();

        assert_eq!(seq.phase(), Phase::Completed);
        assert_eq!(seq.outcome(), Some(PageOutcome::Completed(PageId(7))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(seq.pending_timers().is_empty());
    }

    #[test]
    fn test_rotation_timer_wins_and_tick_path_is_ignored() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(1), slots(&[20, 20, 20]), NullPresenter).unwrap();
        into_focus(&mut seq);

        let rotation = handle_for(&seq, TimerKind::Rotation(0));
        ticks(&mut seq, 5);
        assert!(seq.fire(rotation));
        assert_eq!(seq.phase(), Phase::Focusing(1));
        assert_eq!(seq.focus_remaining(), 20);

        // Same trigger again must not skip slot 1
        assert!(!seq.fire(rotation));
        assert_eq!(seq.phase(), Phase::Focusing(1));
    }

    #[test]
    fn test_tick_wins_and_rotation_timer_is_stale() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(1), slots(&[3, 3, 3]), NullPresenter).unwrap();
        into_focus(&mut seq);

        let rotation = handle_for(&seq, TimerKind::Rotation(0));
        ticks(&mut seq, 3);
        assert_eq!(seq.phase(), Phase::Focusing(1));

        assert!(!seq.fire(rotation));
        assert_eq!(seq.phase(), Phase::Focusing(1));
        assert_eq!(seq.focus_remaining(), 3);
    }

    #[test]
    fn test_zero_duration_last_slot_uses_default() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(1), slots(&[2, 2, 0]), NullPresenter).unwrap();
        let calls = counting(&mut seq);
        into_focus(&mut seq);
        ticks(&mut seq, 4);

        assert_eq!(seq.phase(), Phase::Focusing(2));
        assert_eq!(seq.focus_remaining(), 60);
        assert_eq!(
            seq.drain_timer_requests()
                .iter()
                .find(|r| r.handle.kind == TimerKind::Rotation(2))
                .map(|r| r.delay),
            Some(Duration::from_secs(60))
        );

        ticks(&mut seq, 59);
        assert!(!seq.is_completed());
        seq.tick();
        assert!(seq.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_slot_arms_fallback() {
        let mut seq = PlaybackSequencer::new(PageId(1), config(1), slots(&[5]), NullPresenter).unwrap();
        let calls = counting(&mut seq);
        seq.start();
        seq.tick();
        seq.drain_timer_requests();
        let settle = handle_for(&seq, TimerKind::Settle);
        seq.fire(settle);

        let requests = seq.drain_timer_requests();
        let fallback = requests
            .iter()
            .find(|r| r.handle.kind == TimerKind::FallbackCompletion)
            .unwrap();
        assert_eq!(fallback.delay, Duration::from_secs(6));

        let rotation = handle_for(&seq, TimerKind::Rotation(0));
        assert!(seq.fire(fallback.handle));
        assert!(seq.is_completed());
        assert!(!seq.fire(rotation));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_slots_completes_after_settle() {
        let mut seq = PlaybackSequencer::new(PageId(3), config(2), Vec::new(), NullPresenter).unwrap();
        let calls = counting(&mut seq);
        into_focus(&mut seq);

        assert!(seq.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abort_mid_focus() {
        let presenter = RecordingPresenter::new();
        let mut seq =
            PlaybackSequencer::new(PageId(2), config(1), slots(&[4, 4, 4]), presenter.clone()).unwrap();
        let calls = counting(&mut seq);
        into_focus(&mut seq);
        ticks(&mut seq, 5);
        assert_eq!(seq.phase(), Phase::Focusing(1));

        let rotation = handle_for(&seq, TimerKind::Rotation(1));
        let before = presenter.focus_changes();

        assert!(seq.abort());
        assert!(!seq.abort());
        assert!(!seq.fire(rotation));
        ticks(&mut seq, 20);

        assert_eq!(presenter.focus_changes(), before);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(seq.outcome(), Some(PageOutcome::Aborted(PageId(2))));
        assert!(seq.slots().iter().all(|s| !s.is_focused()));
        assert!(!seq.start());
    }

    #[test]
    fn test_at_most_one_focused() {
        let presenter = RecordingPresenter::new();
        let mut seq =
            PlaybackSequencer::new(PageId(1), config(2), slots(&[3, 4, 5]), presenter.clone()).unwrap();
        into_focus(&mut seq);

        while !seq.is_completed() {
            let focused = seq.slots().iter().filter(|s| s.is_focused()).count();
            assert_eq!(focused, 1);
            seq.tick();
        }
        assert!(seq.slots().iter().all(|s| !s.is_focused()));

        let expected: Vec<PresenterCommand> = [1, 2, 3]
            .iter()
            .flat_map(|&position| {
                [
                    PresenterCommand::Focus { position },
                    PresenterCommand::Unfocus { position },
                ]
            })
            .collect();
        assert_eq!(presenter.focus_changes(), expected);
    }

    #[test]
    fn test_volume_applied_on_start() {
        let presenter = RecordingPresenter::new();
        let mut seq = PlaybackSequencer::new(PageId(1), config(3), slots(&[3, 4]), presenter.clone()).unwrap();
        seq.start();

        let volumes: Vec<_> = presenter
            .commands()
            .into_iter()
            .filter(|c| matches!(c, PresenterCommand::Volume { .. }))
            .collect();
        assert_eq!(volumes.len(), 2);
    }

    #[test]
    fn test_rejects_bad_slot_lists() {
        let err = PlaybackSequencer::new(PageId(1), config(3), slots(&[1, 2, 3, 4]), NullPresenter).unwrap_err();
        assert_eq!(err.error_code(), "TOO_MANY_SLOTS");

        let dup = vec![VideoSlot::new(1, 10), VideoSlot::new(1, 10)];
        let err = PlaybackSequencer::new(PageId(1), config(3), dup, NullPresenter).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_POSITION");

        for position in [0, 4, 7] {
            let err = PlaybackSequencer::new(PageId(1), config(3), vec![VideoSlot::new(position, 10)], NullPresenter)
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_POSITION", "position {}", position);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let zero_default = SessionConfig {
            default_focus_seconds: 0,
            ..config(3)
        };
        let err = PlaybackSequencer::new(PageId(1), zero_default, slots(&[0]), NullPresenter).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_abort_while_settling_discards_settle_timer() {
        let mut seq = PlaybackSequencer::new(PageId(4), config(2), slots(&[5, 5]), NullPresenter).unwrap();
        let calls = counting(&mut seq);
        seq.start();
        ticks(&mut seq, 2);
        assert_eq!(seq.phase(), Phase::Starting);

        let settle = handle_for(&seq, TimerKind::Settle);
        assert!(seq.abort());
        assert!(!seq.fire(settle));

        assert_eq!(seq.phase(), Phase::Completed);
        assert_eq!(seq.focused(), None);
        assert!(seq.pending_timers().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(seq.outcome(), Some(PageOutcome::Aborted(PageId(4))));
    }
}

//! Deterministic replay of a page session on a virtual clock
//!
//! Drives a [`PlaybackSequencer`] exactly the way the async runner does
//! (one tick per second, one-shot timers at their deadlines, ticks before
//! timers when both fall on the same millisecond) without waiting in real
//! time. Used to plan a page ahead of playback and in tests.

use crate::{
    config::SessionConfig,
    notifier::CompletionEvent,
    presenter::NullPresenter,
    sequencer::{PlaybackSequencer, TimerHandle},
    types::*,
    Result,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

const TICK_MS: u64 = TICK_INTERVAL.as_millis() as u64;

/// A phase change observed during the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Milliseconds since `start()`
    pub at_ms: u64,
    pub phase: Phase,
    pub focus_remaining: u32,
}

/// Span during which one slot held focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusWindow {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    pub initial_remaining: u32,
}

impl FocusWindow {
    pub fn length_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Result of a simulated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub page: PageId,
    pub entries: Vec<TimelineEntry>,
    pub ticks: u64,
    pub completions: usize,
    pub finished_at_ms: Option<u64>,
    pub outcome: Option<PageOutcome>,
}

impl SimulationReport {
    /// When the countdown handed over to the settle delay
    pub fn countdown_ended_at_ms(&self) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.phase == Phase::Starting)
            .map(|e| e.at_ms)
    }

    /// Focus windows in rotation order
    pub fn focus_windows(&self) -> Vec<FocusWindow> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let index = entry.phase.focused()?;
                let end_ms = self
                    .entries
                    .get(i + 1)
                    .map(|next| next.at_ms)
                    .or(self.finished_at_ms)?;
                Some(FocusWindow {
                    index,
                    start_ms: entry.at_ms,
                    end_ms,
                    initial_remaining: entry.focus_remaining,
                })
            })
            .collect()
    }
}

/// Virtual-clock driver for one sequencer
pub struct Simulation {
    sequencer: PlaybackSequencer,
    now_ms: u64,
    next_tick_ms: u64,
    ticks: u64,
    timers: Vec<(u64, TimerHandle)>,
    entries: Vec<TimelineEntry>,
    completion: oneshot::Receiver<CompletionEvent>,
    completions: usize,
    finished_at_ms: Option<u64>,
}

impl Simulation {
    /// Wrap a sequencer. Completions are observed through a channel
    /// subscription, so a listener the host registered stays in place.
    pub fn new(mut sequencer: PlaybackSequencer) -> Self {
        let completion = sequencer.subscribe_completion();

        Self {
            sequencer,
            now_ms: 0,
            next_tick_ms: TICK_MS,
            ticks: 0,
            timers: Vec::new(),
            entries: Vec::new(),
            completion,
            completions: 0,
            finished_at_ms: None,
        }
    }

    pub fn sequencer(&self) -> &PlaybackSequencer {
        &self.sequencer
    }

    /// Milliseconds since `start()`
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn start(&mut self) {
        if self.sequencer.start() {
            self.record();
            self.after_event();
        }
    }

    pub fn abort(&mut self) {
        if self.sequencer.abort() {
            self.after_event();
        }
    }

    /// Process the next tick or timer. Returns false once the session is over.
    pub fn step(&mut self) -> bool {
        if self.sequencer.is_completed() || !self.sequencer.is_started() {
            return false;
        }

        let next_timer = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, (at, _))| *at)
            .map(|(i, (at, _))| (i, *at));

        match next_timer {
            Some((i, at)) if at < self.next_tick_ms => {
                let (at, handle) = self.timers.remove(i);
                self.now_ms = at;
                self.sequencer.fire(handle);
            }
            _ => {
                self.now_ms = self.next_tick_ms;
                self.next_tick_ms += TICK_MS;
                self.ticks += 1;
                self.sequencer.tick();
            }
        }

        self.after_event();
        !self.sequencer.is_completed()
    }

    /// Step until the session is over or the clock passes `limit_ms`
    pub fn run_until(&mut self, limit_ms: u64) {
        while self.now_ms <= limit_ms && self.step() {}
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            page: self.sequencer.page(),
            entries: self.entries.clone(),
            ticks: self.ticks,
            completions: self.completions,
            finished_at_ms: self.finished_at_ms,
            outcome: self.sequencer.outcome(),
        }
    }

    fn after_event(&mut self) {
        for request in self.sequencer.drain_timer_requests() {
            let at = self.now_ms + request.delay.as_millis() as u64;
            self.timers.push((at, request.handle));
        }
        let sequencer = &self.sequencer;
        self.timers.retain(|(_, handle)| sequencer.is_armed(handle));

        if self.entries.last().map(|e| e.phase) != Some(self.sequencer.phase()) {
            self.record();
        }
        if self.completion.try_recv().is_ok() {
            self.completions += 1;
        }
        if self.sequencer.is_completed() && self.finished_at_ms.is_none() {
            self.finished_at_ms = Some(self.now_ms);
        }
    }

    fn record(&mut self) {
        let entry = TimelineEntry {
            at_ms: self.now_ms,
            phase: self.sequencer.phase(),
            focus_remaining: self.sequencer.focus_remaining(),
        };
        debug!(at_ms = entry.at_ms, phase = %entry.phase, "Simulated phase change");
        self.entries.push(entry);
    }
}

/// Simulate a whole page session with no presentation attached
pub fn simulate_page(page: PageId, config: SessionConfig, slots: Vec<VideoSlot>) -> Result<SimulationReport> {
    let sequencer = PlaybackSequencer::new(page, config, slots, NullPresenter)?;

    let limit_ms = (u64::from(sequencer.config().countdown_seconds)
        + sequencer.total_focus_seconds()
        + 10)
        * TICK_MS;

    let mut simulation = Simulation::new(sequencer);
    simulation.start();
    simulation.run_until(limit_ms);
    Ok(simulation.report())
}

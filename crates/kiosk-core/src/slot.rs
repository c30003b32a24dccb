//! Slot controller
//!
//! Per-slot view of remaining time and play intent. A controller never
//! decides timing: the sequencer hands it the remaining time on every tick
//! and tells it when to focus or unfocus. Both commands are idempotent and
//! only reach the presenter on a real state change.

use crate::presenter::Presenter;
use crate::types::VideoSlot;
use serde::{Deserialize, Serialize};

/// Where a slot is in its rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// Not focused yet
    Waiting,
    /// Holding exclusive focus
    Focused,
    /// Focus window is over
    Done,
}

/// Cosmetic timer label shown on a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "label", content = "seconds", rename_all = "snake_case")]
pub enum SlotLabel {
    /// Full duration, still waiting its turn
    Waiting(u32),
    /// Remaining seconds while focused
    Counting(u32),
    Done,
}

impl std::fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotLabel::Waiting(seconds) | SlotLabel::Counting(seconds) => write!(f, "{}s", seconds),
            SlotLabel::Done => write!(f, "DONE"),
        }
    }
}

/// Controller for one slot
#[derive(Debug, Clone)]
pub struct SlotController {
    index: usize,
    slot: VideoSlot,
    duration: u32,
    remaining: u32,
    status: SlotStatus,
}

impl SlotController {
    /// Create a controller; zero durations take `default_focus_seconds`
    pub fn new(index: usize, slot: VideoSlot, default_focus_seconds: u32) -> Self {
        let duration = slot.focus_seconds(default_focus_seconds);
        Self {
            index,
            slot,
            duration,
            remaining: duration,
            status: SlotStatus::Waiting,
        }
    }

    /// Rotation index, 0-based
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slot(&self) -> &VideoSlot {
        &self.slot
    }

    /// Effective focus duration in seconds
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Most recent remaining time handed over by the sequencer
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_focused(&self) -> bool {
        self.status == SlotStatus::Focused
    }

    pub fn label(&self) -> SlotLabel {
        match self.status {
            SlotStatus::Waiting => SlotLabel::Waiting(self.remaining),
            SlotStatus::Focused => SlotLabel::Counting(self.remaining),
            SlotStatus::Done => SlotLabel::Done,
        }
    }

    /// Begin exclusive presentation. Returns false if already focused.
    pub fn focus(&mut self, presenter: &mut dyn Presenter) -> bool {
        if self.status == SlotStatus::Focused {
            return false;
        }
        self.status = SlotStatus::Focused;
        presenter.focus(&self.slot);
        presenter.update_label(&self.slot, &self.label());
        true
    }

    /// Stop presentation and mark the slot done. Returns false if it was not focused.
    pub fn unfocus(&mut self, presenter: &mut dyn Presenter) -> bool {
        if self.status != SlotStatus::Focused {
            return false;
        }
        self.status = SlotStatus::Done;
        presenter.unfocus(&self.slot);
        presenter.update_label(&self.slot, &self.label());
        true
    }

    /// Drop focus without issuing presenter commands; the host is tearing down
    pub(crate) fn halt(&mut self) {
        if self.status == SlotStatus::Focused {
            self.status = SlotStatus::Done;
        }
    }

    /// Restore the full duration without touching focus state
    pub(crate) fn reset(&mut self, presenter: &mut dyn Presenter) {
        self.set_remaining(self.duration, presenter);
    }

    pub(crate) fn set_remaining(&mut self, remaining: u32, presenter: &mut dyn Presenter) {
        if self.remaining == remaining {
            return;
        }
        self.remaining = remaining;
        if self.status != SlotStatus::Done {
            presenter.update_label(&self.slot, &self.label());
        }
    }
}

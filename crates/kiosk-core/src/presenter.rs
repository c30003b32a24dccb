//! Presentation layer seam
//!
//! The sequencer never touches media directly. Every visible effect goes
//! through a [`Presenter`], which knows how to start and stop playback and
//! how to update on-screen labels. Presenter failures are the presenter's
//! own business; none of these methods can fail back into the sequencer.

use crate::slot::SlotLabel;
use crate::types::VideoSlot;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Receiver of per-slot commands
pub trait Presenter: Send {
    /// Begin or resume exclusive presentation of `slot`
    fn focus(&mut self, slot: &VideoSlot);

    /// Stop presentation of `slot`, leaving it visible
    fn unfocus(&mut self, slot: &VideoSlot);

    /// The slot's timer label changed
    fn update_label(&mut self, _slot: &VideoSlot, _label: &SlotLabel) {}

    /// Apply the session volume to a slot's player
    fn set_volume(&mut self, _slot: &VideoSlot, _volume: u8) {}

    /// The page countdown changed
    fn show_countdown(&mut self, _remaining: u32) {}
}

/// Presenter that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn focus(&mut self, _slot: &VideoSlot) {}

    fn unfocus(&mut self, _slot: &VideoSlot) {}
}

/// Presenter that reports commands through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn focus(&mut self, slot: &VideoSlot) {
        info!(position = slot.position, title = %slot.title, "Slot focused, playback started");
    }

    fn unfocus(&mut self, slot: &VideoSlot) {
        info!(position = slot.position, title = %slot.title, "Slot unfocused, playback stopped");
    }

    fn show_countdown(&mut self, remaining: u32) {
        info!(
            countdown = %format!("{:02}:{:02}", remaining / 60, remaining % 60),
            "Countdown"
        );
    }
}

/// A command as seen by a presenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PresenterCommand {
    Focus { position: u32 },
    Unfocus { position: u32 },
    Label { position: u32, text: String },
    Volume { position: u32, volume: u8 },
    Countdown { remaining: u32 },
}

impl PresenterCommand {
    /// True for focus and unfocus commands
    pub fn is_focus_change(&self) -> bool {
        matches!(self, PresenterCommand::Focus { .. } | PresenterCommand::Unfocus { .. })
    }
}

/// Presenter that keeps a shared log of every command it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    log: Arc<Mutex<Vec<PresenterCommand>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the commands received so far
    pub fn commands(&self) -> Vec<PresenterCommand> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Only the focus and unfocus commands
    pub fn focus_changes(&self) -> Vec<PresenterCommand> {
        self.commands()
            .into_iter()
            .filter(PresenterCommand::is_focus_change)
            .collect()
    }

    fn push(&self, command: PresenterCommand) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(command);
    }
}

impl Presenter for RecordingPresenter {
    fn focus(&mut self, slot: &VideoSlot) {
        self.push(PresenterCommand::Focus { position: slot.position });
    }

    fn unfocus(&mut self, slot: &VideoSlot) {
        self.push(PresenterCommand::Unfocus { position: slot.position });
    }

    fn update_label(&mut self, slot: &VideoSlot, label: &SlotLabel) {
        self.push(PresenterCommand::Label {
            position: slot.position,
            text: label.to_string(),
        });
    }

    fn set_volume(&mut self, slot: &VideoSlot, volume: u8) {
        self.push(PresenterCommand::Volume {
            position: slot.position,
            volume,
        });
    }

    fn show_countdown(&mut self, remaining: u32) {
        self.push(PresenterCommand::Countdown { remaining });
    }
}

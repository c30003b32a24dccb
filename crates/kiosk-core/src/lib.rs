//! Kiosk Core - Page Playback Sequencing for unattended kiosk displays
//!
//! This crate provides the timing core of a kiosk that cycles three videos
//! per page:
//! - Countdown, settle delay and focus rotation state machine
//! - Per-slot controllers with idempotent focus/unfocus commands
//! - One-shot page completion signalling
//! - Real-time page runner on tokio and a deterministic simulation
//! - Session configuration and page resolution from a JSON library
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Kiosk Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐                    ┌──────────────┐           │
//! │  │   Session    │                    │     Page     │           │
//! │  │    Config    │                    │   Catalog    │           │
//! │  └──────┬───────┘                    └──────┬───────┘           │
//! │         └─────────────────┬─────────────────┘                   │
//! │                    ┌──────┴──────┐      ┌──────────────┐        │
//! │                    │  Playback   │◄─────┤ Page Runner/ │        │
//! │                    │  Sequencer  │      │  Simulation  │        │
//! │                    └──────┬──────┘      └──────────────┘        │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │  Presenter   │◄─┤    Slot     │  │  Completion  │            │
//! │  │              │  │ Controllers │  │   Notifier   │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod notifier;
pub mod presenter;
pub mod runner;
pub mod sequencer;
pub mod simulation;
pub mod slot;
pub mod types;

pub use catalog::{Catalog, PageSource, ResolvedPage};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use notifier::{CompletionEvent, CompletionNotifier};
pub use presenter::{LogPresenter, NullPresenter, Presenter, PresenterCommand, RecordingPresenter};
pub use runner::{PageHandle, PageRunner};
pub use sequencer::{
    PlaybackSequencer, SequencerSnapshot, SequencerState, SlotSnapshot, TimerHandle, TimerKind,
};
pub use simulation::{simulate_page, FocusWindow, Simulation, SimulationReport};
pub use slot::{SlotController, SlotLabel, SlotStatus};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Kiosk Core initialized");
}

//! Core types for Kiosk Core

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Nominal number of slots on a page
pub const MAX_SLOTS: usize = 3;

/// Period of the sequencer tick
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between the end of the countdown and the first focus
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Extra time the fallback completion timer waits past the last slot's duration
pub const FALLBACK_GRACE: Duration = Duration::from_secs(1);

/// Identifier of a kiosk page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u32);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one playback session of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert a length in fractional minutes into whole focus seconds.
///
/// The value is truncated toward zero. Missing, non-finite and non-positive
/// lengths, as well as lengths shorter than one second, use `default_seconds`.
pub fn focus_seconds_from_minutes(minutes: Option<f64>, default_seconds: u32) -> u32 {
    match minutes {
        Some(m) if m.is_finite() && m > 0.0 => {
            let seconds = (m * 60.0).trunc();
            if seconds >= 1.0 {
                seconds.min(u32::MAX as f64) as u32
            } else {
                default_seconds
            }
        }
        _ => default_seconds,
    }
}

/// One playback position on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSlot {
    /// Rotation position, 1-based and unique within a page
    pub position: u32,
    /// Exclusive focus time granted to this slot
    pub duration_seconds: u32,
    /// Number shown on screen
    pub display_number: u32,
    pub title: String,
    pub url: String,
}

impl VideoSlot {
    /// Create a slot with an explicit duration in seconds
    pub fn new(position: u32, duration_seconds: u32) -> Self {
        Self {
            position,
            duration_seconds,
            display_number: position,
            title: String::new(),
            url: String::new(),
        }
    }

    /// Create a slot from a video length in minutes
    pub fn from_minutes(position: u32, minutes: Option<f64>, default_seconds: u32) -> Self {
        Self::new(position, focus_seconds_from_minutes(minutes, default_seconds))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_display_number(mut self, display_number: u32) -> Self {
        self.display_number = display_number;
        self
    }

    /// Duration of the focus window, substituting `default_seconds` for zero
    pub fn focus_seconds(&self, default_seconds: u32) -> u32 {
        if self.duration_seconds == 0 {
            default_seconds
        } else {
            self.duration_seconds
        }
    }
}

/// Sequencer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "slot", rename_all = "snake_case")]
pub enum Phase {
    /// Visible countdown before anything plays
    Countdown,
    /// Settle delay between the countdown and the first focus
    Starting,
    /// Slot at this index holds exclusive focus
    Focusing(usize),
    /// Terminal
    Completed,
}

impl Phase {
    /// Index of the focused slot, if any
    pub fn focused(&self) -> Option<usize> {
        match self {
            Phase::Focusing(index) => Some(*index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Countdown => write!(f, "countdown"),
            Phase::Starting => write!(f, "starting"),
            Phase::Focusing(index) => write!(f, "focusing({})", index),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// How a page session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "page", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Every slot had its focus window and the completion event fired
    Completed(PageId),
    /// The host stopped the page early
    Aborted(PageId),
}

impl PageOutcome {
    pub fn page(&self) -> PageId {
        match self {
            PageOutcome::Completed(page) | PageOutcome::Aborted(page) => *page,
        }
    }
}

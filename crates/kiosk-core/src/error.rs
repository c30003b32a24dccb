//! Error types for Kiosk Core

use thiserror::Error;

/// Result type alias for kiosk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kiosk error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Page resolution errors
    #[error("Page not found: {page}")]
    PageNotFound { page: u32 },

    #[error("Too many slots on a page: {count} (at most {max})")]
    TooManySlots { count: usize, max: usize },

    #[error("Duplicate slot position {position}")]
    DuplicatePosition { position: u32 },

    #[error("Slot position {position} out of range 1..={max}")]
    InvalidPosition { position: u32, max: usize },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Returns true if the host can retry after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::PageNotFound { .. })
    }

    /// Returns the error code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::PageNotFound { .. } => "PAGE_NOT_FOUND",
            Error::TooManySlots { .. } => "TOO_MANY_SLOTS",
            Error::DuplicatePosition { .. } => "DUPLICATE_POSITION",
            Error::InvalidPosition { .. } => "INVALID_POSITION",
            Error::Json(_) => "JSON",
            Error::Internal(_) => "INTERNAL",
            Error::Io(_) => "IO",
        }
    }
}

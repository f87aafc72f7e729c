//! Error types for devcal.

use thiserror::Error;

/// Errors that can occur in devcal operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to decode field '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("Failed to encode: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("The calendar with the ID {0} could not be found")]
    CalendarNotFound(String),

    #[error("The event with the ID {0} could not be found")]
    EventNotFound(String),

    #[error("Calendar with ID {0} is read-only")]
    ReadOnlyCalendar(String),

    #[error("The user has not allowed this application to modify their calendar(s)")]
    NotAuthorized,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for devcal operations.
pub type CoreResult<T> = Result<T, CoreError>;

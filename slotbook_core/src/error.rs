//! Error types for the slotbook_core library.

use crate::Appointment;
use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for slotbook_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structurally invalid booking
    #[error("invalid appointment: {0}")]
    BadInput(String),

    /// Recurrence expansion hit the safety cap
    #[error("recurring appointment produces too many occurrences (limit {limit})")]
    TooManyOccurrences { limit: usize },

    /// Candidate occurrences overlap existing records; nothing was committed
    #[error("{}", ConflictMessage(.conflicts))]
    Conflict { conflicts: Vec<Appointment> },

    /// No record with this identifier
    #[error("appointment not found: {0}")]
    NotFound(String),

    /// The commit took effect in memory but the snapshot write failed
    #[error("appointments committed in memory but not persisted: {source}")]
    Unsaved {
        committed: Vec<Appointment>,
        #[source]
        source: Box<Error>,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The closed taxonomy callers branch on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    TooManyOccurrences,
    Conflict,
    NotFound,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadInput(_) => ErrorKind::BadInput,
            Error::TooManyOccurrences { .. } => ErrorKind::TooManyOccurrences,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Unsaved { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::Toml(_)
            | Error::Config(_) => ErrorKind::Internal,
        }
    }

    /// Existing records that blocked a create, sorted by start time
    pub fn conflicts(&self) -> &[Appointment] {
        match self {
            Error::Conflict { conflicts } => conflicts,
            _ => &[],
        }
    }

    /// Records that are live in memory despite this error
    pub fn committed(&self) -> &[Appointment] {
        match self {
            Error::Unsaved { committed, .. } => committed,
            _ => &[],
        }
    }
}

struct ConflictMessage<'a>(&'a [Appointment]);

impl fmt::Display for ConflictMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("appointment conflicts with an existing appointment");
        }
        f.write_str("This time slot conflicts with existing appointment(s): ")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(
                f,
                "{} ({} - {})",
                c.title,
                c.start_time.to_rfc3339(),
                c.end_time.to_rfc3339()
            )?;
        }
        Ok(())
    }
}

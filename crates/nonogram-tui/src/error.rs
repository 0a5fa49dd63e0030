use std::io;

use nonogram_core::{InvalidGrid, InvariantViolation, NoteError, PuzzleLoadError};

use crate::config::PatternError;
use crate::display::DisplayError;

/// Everything that can go wrong while driving a solving session or one of
/// the puzzle commands
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SessionError {
    /// Reading or writing `destination` failed
    #[display("{destination}: {source}")]
    Io {
        destination: String,
        source: io::Error,
    },
    #[display("invalid grid: {_0}")]
    InvalidGrid(#[from] InvalidGrid),
    #[display("cannot load puzzle: {_0}")]
    PuzzleLoad(#[from] PuzzleLoadError),
    #[display("{_0}")]
    Note(#[from] NoteError),
    #[display("bad output pattern: {_0}")]
    Pattern(#[from] PatternError),
    /// Per-solution files were requested for a single artifact
    #[display("{destination}: a single {artifact} cannot go to numbered files")]
    UnsupportedDestination {
        destination: String,
        artifact: &'static str,
    },
    #[display("internal error: {_0}")]
    InvariantViolation(#[from] InvariantViolation),
}

impl SessionError {
    pub fn io(destination: impl Into<String>, source: io::Error) -> Self {
        SessionError::Io {
            destination: destination.into(),
            source,
        }
    }

    /// One-line message for non-verbose runs
    pub fn generic_message(&self) -> String {
        match self {
            SessionError::Io { destination, .. } => format!("{destination}: can't access"),
            SessionError::InvalidGrid(_) | SessionError::InvariantViolation(_) => {
                "internal error".into()
            }
            SessionError::PuzzleLoad(_) => "error in puzzle".into(),
            SessionError::Note(NoteError::NotFound(name)) => format!("`{name}' not set"),
            SessionError::Note(NoteError::AlreadyExists(name)) => format!("`{name}' already set"),
            SessionError::Pattern(_) => "bad output pattern".into(),
            SessionError::UnsupportedDestination { .. } => "inappropriate output".into(),
        }
    }
}

impl From<DisplayError> for SessionError {
    fn from(err: DisplayError) -> Self {
        match err {
            DisplayError::Io(source) => SessionError::io("display", source),
            DisplayError::Invariant(violation) => SessionError::InvariantViolation(violation),
        }
    }
}

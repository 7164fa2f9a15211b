//! Error types for the session engine.

use thiserror::Error;

/// Malformed coordinate or annotation data.
///
/// Annotation walkers skip the offending entry and carry on; only the codec
/// itself surfaces these to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("coordinate '{code}' must be exactly two letters")]
    BadLength { code: String },

    #[error("coordinate '{code}' uses a character outside 'a'..='z'")]
    OutOfRange { code: String },

    #[error("vertex ({x}, {y}) cannot be encoded as two letters")]
    NotEncodable { x: usize, y: usize },

    #[error("label entry '{entry}' is not of the form 'vertex:text'")]
    BadLabel { entry: String },
}

/// Errors raised by run setup and by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no eligible puzzles for rank {rank}")]
    InsufficientPuzzles { rank: String },

    #[error("the archive contains no ranked puzzles")]
    EmptyArchive,

    #[error("cannot {operation} while {mode}")]
    InvalidTransition {
        operation: &'static str,
        mode: &'static str,
    },

    #[error("puzzle index {index} out of range (run has {len} puzzles)")]
    PuzzleIndexOutOfRange { index: usize, len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Format(#[from] FormatError),
}

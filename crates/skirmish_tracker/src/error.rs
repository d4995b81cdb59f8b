//! # Tracker Error Types

use skirmish_rank::RankError;
use thiserror::Error;

/// Errors that can occur while setting up or tearing down a match.
///
/// Per-message processing never returns errors; malformed input is
/// absorbed as a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Invalid tracker configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The engine registered a message name this tracker does not decode.
    #[error("unknown message name: {0}")]
    UnknownMessage(String),

    /// Message id outside the registry.
    #[error("message id {0} out of range")]
    MessageIdOutOfRange(i32),

    /// A message kind was bound twice.
    #[error("message {name} already bound to id {id}")]
    DuplicateMessage {
        /// Message name.
        name: &'static str,
        /// Id it was first bound to.
        id: i32,
    },

    /// Two message kinds share one id.
    #[error("message id {id} already used by {existing}")]
    DuplicateMessageId {
        /// The contested id.
        id: i32,
        /// Kind already holding it.
        existing: &'static str,
    },

    /// Rank persistence failure.
    #[error(transparent)]
    Rank(#[from] RankError),
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

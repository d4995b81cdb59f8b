//! # Rank Error Types
//!
//! All errors that can occur while loading, saving, or configuring the
//! leaderboard.

use thiserror::Error;

/// Errors that can occur in the rank system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RankError {
    /// Underlying file system error.
    #[error("rank file i/o error: {0}")]
    Io(String),

    /// The rank file does not exist yet.
    #[error("rank file not found: {0}")]
    NotFound(String),

    /// File does not start with the rank magic bytes.
    #[error("not a rank file (bad magic)")]
    BadMagic,

    /// File was written by a different format version.
    #[error("rank file version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version stored in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// File is shorter or longer than its header claims.
    #[error("rank file truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Size implied by the header.
        expected: usize,
        /// Actual size on disk.
        actual: usize,
    },

    /// Record section does not match the stored checksum.
    #[error("rank file checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum in the header.
        stored: u32,
        /// Checksum of the bytes read.
        computed: u32,
    },

    /// Invalid point table file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background saver thread has stopped.
    #[error("rank saver is shut down")]
    SaverClosed,
}

impl RankError {
    /// Maps an I/O error, keeping "not found" distinct.
    pub(crate) fn from_io(path: &std::path::Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Io(format!("{}: {err}", path.display()))
        }
    }
}

/// Result type for rank operations.
pub type RankResult<T> = Result<T, RankError>;

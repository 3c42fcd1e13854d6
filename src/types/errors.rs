//! Error types used across mountyard.
use thiserror::Error;

use crate::sys::SysError;

/// Errors originated by the planner/executor core.
///
/// Syscall failures surface through the transparent [`Error::Sys`] variant
/// so a caller (or a test injecting faults) can compare them to the
/// original value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The mount target or bind source exists but is not a directory.
    #[error("cannot use {path:?} for mounting, not a directory")]
    NotADirectory { path: String },

    /// `lstat` failed for a reason other than the path being absent.
    #[error("cannot inspect {path:?}: {source}")]
    Inspect { path: String, source: SysError },

    /// `mkdirat` failed for a reason other than the segment already existing.
    #[error("cannot mkdir path segment {segment:?}: {source}")]
    MkdirSegment { segment: String, source: SysError },

    /// A numeric action tag outside the known set.
    #[error("cannot process mount change, unknown action: {0}")]
    UnknownAction(u32),

    /// Malformed fstab-style text.
    #[error("cannot parse mount entry: {0}")]
    Parse(String),

    /// Verbatim failure from the system interface.
    #[error(transparent)]
    Sys(#[from] SysError),
}

/// Convenient alias for results returning a mountyard [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

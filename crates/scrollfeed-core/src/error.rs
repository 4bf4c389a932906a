#![forbid(unsafe_code)]

//! Error types for snapshot construction and the commit protocol.

use crate::surface::SurfaceError;
use std::fmt;

/// Errors produced by the pagination core.
///
/// Trigger-side bounds problems are never errors; they are silent no-ops.
/// These variants cover snapshot construction and commit completion.
#[derive(Debug)]
pub enum FeedError {
    /// The surface failed to apply a commit. Loading was reset and the cursor
    /// left unchanged, so the same sections will be retried on the next
    /// trigger.
    LoadFailed {
        /// Sections the failed commit was appending.
        sections: Vec<usize>,
        source: SurfaceError,
    },
    /// A requested section index is not in the dataset.
    SectionOutOfRange { index: usize, total: usize },
    /// A requested section is already present in the snapshot.
    DuplicateSection(usize),
    /// A completion arrived for a commit that is not in flight.
    StaleCommit { id: u64, in_flight: Option<u64> },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::LoadFailed { sections, source } => {
                write!(f, "load failed for sections {sections:?}: {source}")
            }
            FeedError::SectionOutOfRange { index, total } => {
                write!(f, "section {index} out of range (total {total})")
            }
            FeedError::DuplicateSection(index) => {
                write!(f, "section {index} already present in snapshot")
            }
            FeedError::StaleCommit { id, in_flight } => match in_flight {
                Some(current) => write!(f, "stale commit {id} (in flight: {current})"),
                None => write!(f, "stale commit {id} (nothing in flight)"),
            },
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::LoadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl FeedError {
    /// Whether this error leaves the controller able to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::LoadFailed { .. })
    }
}

/// Result type for pagination operations.
pub type FeedResult<T> = Result<T, FeedError>;

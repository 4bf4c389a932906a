#![forbid(unsafe_code)]

//! Contract between the pagination core and whatever displays the list.
//!
//! The surface owns the committed [`Snapshot`]. The core only reads it and
//! hands over new snapshots through [`PresentationSurface::apply`]; returning
//! from `apply` is the completion signal for that commit.

use crate::snapshot::Snapshot;
use std::fmt;
use std::io;

/// Errors a surface can report when applying a snapshot.
#[derive(Debug)]
pub enum SurfaceError {
    /// The surface refused the snapshot.
    Rejected(String),
    /// Output failed while presenting the snapshot.
    Io(io::Error),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Rejected(reason) => write!(f, "snapshot rejected: {reason}"),
            SurfaceError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurfaceError::Rejected(_) => None,
            SurfaceError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for SurfaceError {
    fn from(e: io::Error) -> Self {
        SurfaceError::Io(e)
    }
}

/// A host that displays committed snapshots.
///
/// Implementations must:
/// - report only already-applied content from [`snapshot`](Self::snapshot)
///   and [`current_section_count`](Self::current_section_count);
/// - return from [`apply`](Self::apply) exactly once per call.
pub trait PresentationSurface {
    /// The currently committed snapshot.
    fn snapshot(&self) -> Snapshot;

    /// Number of sections in the committed snapshot.
    fn current_section_count(&self) -> usize {
        self.snapshot().section_count()
    }

    /// Replace the committed content with `snapshot`.
    ///
    /// `animate` is always `false` for appends so prior rows never move.
    fn apply(&mut self, snapshot: Snapshot, animate: bool) -> Result<(), SurfaceError>;

    /// Drop the trailing "loading more" affordance.
    fn remove_loading_indicator(&mut self);
}

impl<S: PresentationSurface + ?Sized> PresentationSurface for &mut S {
    fn snapshot(&self) -> Snapshot {
        (**self).snapshot()
    }

    fn current_section_count(&self) -> usize {
        (**self).current_section_count()
    }

    fn apply(&mut self, snapshot: Snapshot, animate: bool) -> Result<(), SurfaceError> {
        (**self).apply(snapshot, animate)
    }

    fn remove_loading_indicator(&mut self) {
        (**self).remove_loading_indicator();
    }
}

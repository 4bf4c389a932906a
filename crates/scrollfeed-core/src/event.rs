#![forbid(unsafe_code)]

//! Host events delivered to the runtime.

use crate::index_path::IndexPath;

/// Canonical host event.
///
/// The host (a scroll view, a test script) emits these; models convert them
/// into their own message type via `From<Event>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The row at this position is about to become visible.
    RowWillDisplay(IndexPath),
    /// The host is going away; the program should stop.
    Shutdown,
}

impl Event {
    /// Shorthand for [`Event::RowWillDisplay`].
    #[inline]
    #[must_use]
    pub const fn row(section: usize, row: usize) -> Self {
        Self::RowWillDisplay(IndexPath::new(section, row))
    }

    /// Stable name for tracing.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::RowWillDisplay(_) => "RowWillDisplay",
            Self::Shutdown => "Shutdown",
        }
    }
}

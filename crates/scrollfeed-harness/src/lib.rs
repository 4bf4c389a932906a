#![forbid(unsafe_code)]

//! Test doubles and fixtures for scrollfeed.
//!
//! - [`RecordingSurface`]: an in-memory [`PresentationSurface`] that keeps
//!   every applied snapshot, counts loading-indicator removals, and can be
//!   scripted to reject applies.
//! - [`snapshot_to_text`]: a plain-text rendering of a snapshot for
//!   assertions, one line per section.
//!
//! # Quick Start
//!
//! ```ignore
//! use scrollfeed_harness::RecordingSurface;
//!
//! let mut surface = RecordingSurface::new();
//! surface.fail_next_apply("disk full");
//! // drive a controller against `surface` ...
//! assert_eq!(surface.apply_count(), 1);
//! ```

use scrollfeed_core::{PresentationSurface, Snapshot, SurfaceError};
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;

/// Footer line shown while more sections may load.
pub const LOADING_FOOTER: &str = "… loading";

/// One accepted `apply` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRecord {
    /// Sections committed after the apply.
    pub section_count: usize,
    /// Section identifiers added by this apply, in order.
    pub appended: Vec<usize>,
    /// Animation flag passed by the caller.
    pub animate: bool,
    /// Whether the new snapshot kept every previously committed section in
    /// place.
    pub append_only: bool,
}

/// In-memory surface that records what the core asked of it.
#[derive(Debug)]
pub struct RecordingSurface {
    committed: Snapshot,
    applies: Vec<ApplyRecord>,
    rejected: usize,
    scripted_failures: VecDeque<String>,
    indicator_visible: bool,
    indicator_removals: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Create an empty surface with its loading indicator showing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            committed: Snapshot::new(),
            applies: Vec::new(),
            rejected: 0,
            scripted_failures: VecDeque::new(),
            indicator_visible: true,
            indicator_removals: 0,
        }
    }

    /// Reject the next `apply` with `reason`. Calls queue up.
    pub fn fail_next_apply(&mut self, reason: impl Into<String>) {
        self.scripted_failures.push_back(reason.into());
    }

    /// Accepted applies, in order.
    #[must_use]
    pub fn applies(&self) -> &[ApplyRecord] {
        &self.applies
    }

    /// Number of accepted applies.
    #[must_use]
    pub fn apply_count(&self) -> usize {
        self.applies.len()
    }

    /// Number of applies that were rejected.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    #[must_use]
    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    /// How many times `remove_loading_indicator` was called.
    #[must_use]
    pub fn indicator_removals(&self) -> usize {
        self.indicator_removals
    }

    /// The committed snapshot, by reference.
    #[must_use]
    pub fn committed(&self) -> &Snapshot {
        &self.committed
    }

    /// Plain-text rendering of the committed content, with the loading
    /// footer while the indicator is visible.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = snapshot_to_text(&self.committed);
        if self.indicator_visible {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(LOADING_FOOTER);
        }
        out
    }
}

impl PresentationSurface for RecordingSurface {
    fn snapshot(&self) -> Snapshot {
        self.committed.clone()
    }

    fn current_section_count(&self) -> usize {
        self.committed.section_count()
    }

    fn apply(&mut self, snapshot: Snapshot, animate: bool) -> Result<(), SurfaceError> {
        if let Some(reason) = self.scripted_failures.pop_front() {
            self.rejected += 1;
            return Err(SurfaceError::Rejected(reason));
        }
        let append_only = snapshot.extends(&self.committed);
        let start = self
            .committed
            .section_count()
            .min(snapshot.section_count());
        let appended = snapshot.section_indices()[start..].to_vec();
        self.applies.push(ApplyRecord {
            section_count: snapshot.section_count(),
            appended,
            animate,
            append_only,
        });
        self.committed = snapshot;
        Ok(())
    }

    fn remove_loading_indicator(&mut self) {
        self.indicator_visible = false;
        self.indicator_removals += 1;
    }
}

/// Render a snapshot as text: `§<section>: <items...>` per line.
#[must_use]
pub fn snapshot_to_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for (i, section) in snapshot.sections().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "§{}:", section.index());
        for item in section.items() {
            let _ = write!(out, " {item}");
        }
    }
    out
}

#![forbid(unsafe_code)]

//! Pagination state machine.
//!
//! The controller appends sections to a presentation surface two at a time.
//! An append is triggered when the last row of the last loaded section is
//! about to display; the new snapshot is built immediately but applied only
//! after a delay, modelling slow I/O. While an append is in flight further
//! triggers are ignored, so at most one commit is ever outstanding.
//!
//! # Commit protocol
//!
//! 1. [`on_row_about_to_display`](PaginationController::on_row_about_to_display)
//!    checks the trigger condition and calls
//!    [`append_next_sections`](PaginationController::append_next_sections).
//! 2. `append_next_sections` marks the controller loading and returns a
//!    [`PendingCommit`] holding the next snapshot.
//! 3. The caller delivers the pending commit back after its delay, on the
//!    thread that owns the controller, via
//!    [`complete_commit`](PaginationController::complete_commit).
//! 4. `complete_commit` applies the snapshot, clears loading, advances the
//!    cursor, and removes the loading indicator once every section is shown.
//!
//! A failed apply clears loading but leaves the cursor alone, so the next
//! trigger retries the same pair.

use scrollfeed_core::{
    Dataset, FeedConfig, FeedError, FeedResult, IndexPath, ListState, PresentationSurface,
    Snapshot, build_initial_dataset,
};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Sections appended per commit.
const SECTIONS_PER_COMMIT: usize = 2;

/// Identifier of one append, unique per controller.
pub type CommitId = u64;

/// A built snapshot waiting to be applied.
#[derive(Debug, Clone)]
pub struct PendingCommit {
    id: CommitId,
    sections: Vec<usize>,
    snapshot: Snapshot,
    delay: Duration,
}

impl PendingCommit {
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommitId {
        self.id
    }

    /// Section identifiers this commit appends.
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[usize] {
        &self.sections
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// How long to wait before completing.
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// State after a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Sections on the surface after the commit.
    pub committed_sections: usize,
    /// Cursor after the commit.
    pub cursor: usize,
    /// No further pair of sections can be appended.
    pub exhausted: bool,
    /// This commit removed the loading indicator.
    pub indicator_removed: bool,
}

/// Single-writer controller over an ordered dataset.
#[derive(Debug)]
pub struct PaginationController {
    list: ListState,
    cursor: usize,
    in_flight: Option<CommitId>,
    next_commit_id: CommitId,
    commit_latency: Duration,
    animate: bool,
    initialized: bool,
    indicator_removed: bool,
}

impl PaginationController {
    /// Build the dataset described by `config` and wrap it.
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_dataset(
            build_initial_dataset(config.total_sections, config.page_size),
            config,
        )
    }

    /// Use a prebuilt dataset; `config` supplies latency and animation.
    #[must_use]
    pub fn with_dataset(dataset: Dataset, config: &FeedConfig) -> Self {
        Self {
            list: ListState::new(dataset),
            cursor: 0,
            in_flight: None,
            next_commit_id: 0,
            commit_latency: config.commit_latency,
            animate: config.animate,
            initialized: false,
            indicator_removed: false,
        }
    }

    /// Index of the next section not yet appended.
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether an append is in flight.
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Id of the in-flight append, if any.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> Option<CommitId> {
        self.in_flight
    }

    #[inline]
    #[must_use]
    pub fn total_sections(&self) -> usize {
        self.list.dataset().len()
    }

    #[inline]
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.list.dataset().page_size()
    }

    #[inline]
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        self.list.dataset()
    }

    /// Whether the initial commit has been applied.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the loading indicator has been removed.
    #[inline]
    #[must_use]
    pub fn indicator_removed(&self) -> bool {
        self.indicator_removed
    }

    /// No further pair of sections can be appended.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        let dataset = self.list.dataset();
        !(dataset.contains(self.cursor) && dataset.contains(self.cursor + 1))
    }

    /// Commit the first two sections synchronously and advance the cursor.
    ///
    /// With fewer than two sections only those that exist are committed.
    /// Calling this again after a successful run is a no-op.
    ///
    /// # Errors
    ///
    /// [`FeedError::LoadFailed`] if the surface rejects the snapshot; the
    /// cursor stays at 0 and `initialize` may be called again.
    pub fn initialize<S: PresentationSurface>(
        &mut self,
        surface: &mut S,
    ) -> FeedResult<CommitOutcome> {
        if self.initialized {
            debug!("initialize called twice; ignoring");
            return Ok(self.outcome(surface.current_section_count(), false));
        }

        let sections: Vec<usize> = (0..SECTIONS_PER_COMMIT.min(self.total_sections())).collect();
        let snapshot = self
            .list
            .snapshot_with_appended(&surface.snapshot(), &sections)?;
        let committed = snapshot.section_count();
        if !sections.is_empty() {
            surface
                .apply(snapshot, self.animate)
                .map_err(|source| {
                    warn!(%source, "initial commit failed");
                    FeedError::LoadFailed {
                        sections: sections.clone(),
                        source,
                    }
                })?;
        }

        self.initialized = true;
        self.forward_cursor();
        let indicator_removed = self.remove_indicator_if_complete(committed, surface);
        info!(
            committed,
            cursor = self.cursor,
            total = self.total_sections(),
            "initial sections committed"
        );
        Ok(self.outcome(committed, indicator_removed))
    }

    /// React to a row becoming visible.
    ///
    /// Triggers an append only when nothing is in flight, `position` is the
    /// last row of section `cursor - 1`, and the surface shows no more than
    /// `cursor` sections. Everything else, including a cursor of 0, is a
    /// no-op.
    pub fn on_row_about_to_display<S: PresentationSurface>(
        &mut self,
        position: IndexPath,
        surface: &S,
    ) -> Option<PendingCommit> {
        if let Some(id) = self.in_flight {
            trace!(%position, commit = id, "trigger ignored: append in flight");
            return None;
        }
        let last_index = self.cursor.checked_sub(1)?;
        let last_row = self.list.dataset().get(last_index)?.last_row()?;
        if position != IndexPath::new(last_index, last_row) {
            return None;
        }
        let committed = surface.current_section_count();
        if committed > self.cursor {
            trace!(%position, committed, cursor = self.cursor, "trigger ignored: surface ahead");
            return None;
        }
        debug!(%position, cursor = self.cursor, "end of loaded data reached");
        self.append_next_sections(surface)
    }

    /// Start appending sections `cursor` and `cursor + 1`.
    ///
    /// Returns `None` when either index is past the dataset (the terminal
    /// condition) or an append is already in flight.
    pub fn append_next_sections<S: PresentationSurface>(
        &mut self,
        surface: &S,
    ) -> Option<PendingCommit> {
        if self.in_flight.is_some() {
            return None;
        }
        if self.is_exhausted() {
            debug!(cursor = self.cursor, "dataset exhausted; nothing to append");
            return None;
        }

        let sections = vec![self.cursor, self.cursor + 1];
        let snapshot = match self
            .list
            .snapshot_with_appended(&surface.snapshot(), &sections)
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, ?sections, "cannot build append snapshot");
                return None;
            }
        };

        let id = self.next_commit_id;
        self.next_commit_id += 1;
        self.in_flight = Some(id);
        info!(
            commit = id,
            ?sections,
            delay_ms = self.commit_latency.as_millis() as u64,
            "append started"
        );
        Some(PendingCommit {
            id,
            sections,
            snapshot,
            delay: self.commit_latency,
        })
    }

    /// Apply a pending commit. Runs once per append, on the owning thread.
    ///
    /// # Errors
    ///
    /// - [`FeedError::StaleCommit`] if `pending` is not the in-flight
    ///   commit; nothing changes.
    /// - [`FeedError::LoadFailed`] if the surface rejects the snapshot;
    ///   loading is cleared and the cursor is unchanged.
    pub fn complete_commit<S: PresentationSurface>(
        &mut self,
        pending: PendingCommit,
        surface: &mut S,
    ) -> FeedResult<CommitOutcome> {
        if self.in_flight != Some(pending.id) {
            warn!(commit = pending.id, in_flight = ?self.in_flight, "stale commit ignored");
            return Err(FeedError::StaleCommit {
                id: pending.id,
                in_flight: self.in_flight,
            });
        }

        let PendingCommit {
            id,
            sections,
            snapshot,
            ..
        } = pending;
        let committed = snapshot.section_count();
        self.in_flight = None;

        if let Err(source) = surface.apply(snapshot, self.animate) {
            warn!(
                commit = id,
                %source,
                cursor = self.cursor,
                "commit failed; will retry on next trigger"
            );
            return Err(FeedError::LoadFailed { sections, source });
        }

        self.forward_cursor();
        let indicator_removed = self.remove_indicator_if_complete(committed, surface);
        info!(commit = id, committed, cursor = self.cursor, "append committed");
        Ok(self.outcome(committed, indicator_removed))
    }

    /// Advance the cursor by one commit, never past the dataset.
    pub fn forward_cursor(&mut self) {
        let total = self.total_sections();
        if self.cursor >= total {
            return;
        }
        self.cursor = (self.cursor + SECTIONS_PER_COMMIT).min(total);
    }

    fn remove_indicator_if_complete<S: PresentationSurface>(
        &mut self,
        committed: usize,
        surface: &mut S,
    ) -> bool {
        if self.indicator_removed || committed < self.total_sections() {
            return false;
        }
        surface.remove_loading_indicator();
        self.indicator_removed = true;
        info!(total = self.total_sections(), "all sections loaded");
        true
    }

    fn outcome(&self, committed_sections: usize, indicator_removed: bool) -> CommitOutcome {
        CommitOutcome {
            committed_sections,
            cursor: self.cursor,
            exhausted: self.is_exhausted(),
            indicator_removed,
        }
    }
}

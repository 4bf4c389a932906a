#![forbid(unsafe_code)]

//! Runtime model for a paginated list.
//!
//! [`FeedApp`] owns a [`PaginationController`] and the surface it drives.
//! Pending commits are handed to the runtime as delayed background tasks; the
//! task simply returns the commit, so the apply itself always runs inside
//! `update` on the runtime thread.

use crate::controller::{CommitOutcome, PaginationController, PendingCommit};
use scrollfeed_core::{Event, FeedConfig, FeedError, IndexPath, PresentationSurface};
use scrollfeed_runtime::program::{Cmd, Model, TaskSpec};
use tracing::{debug, warn};

/// Task name used for delayed appends.
pub const APPEND_TASK: &str = "append-sections";

/// Messages understood by [`FeedApp`].
#[derive(Debug)]
pub enum FeedMsg {
    /// The host is about to display this row.
    RowWillDisplay(IndexPath),
    /// A delayed append is ready to be applied.
    CommitReady(PendingCommit),
    /// Stop the program.
    Shutdown,
}

impl From<Event> for FeedMsg {
    fn from(event: Event) -> Self {
        match event {
            Event::RowWillDisplay(position) => FeedMsg::RowWillDisplay(position),
            Event::Shutdown => FeedMsg::Shutdown,
        }
    }
}

/// Paginated list model: controller plus presentation surface.
pub struct FeedApp<S: PresentationSurface> {
    controller: PaginationController,
    surface: S,
    last_error: Option<FeedError>,
    failures: usize,
    commits: usize,
}

impl<S: PresentationSurface> FeedApp<S> {
    /// Create an app over the dataset described by `config`.
    pub fn new(config: &FeedConfig, surface: S) -> Self {
        Self::with_controller(PaginationController::new(config), surface)
    }

    pub fn with_controller(controller: PaginationController, surface: S) -> Self {
        Self {
            controller,
            surface,
            last_error: None,
            failures: 0,
            commits: 0,
        }
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Most recent commit failure, if any.
    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    /// Number of failed commits so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Number of successful commits, including the initial one.
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn initialize(&mut self) -> Cmd<FeedMsg> {
        match self.controller.initialize(&mut self.surface) {
            Ok(outcome) => self.committed(outcome),
            Err(err) => self.failed(err),
        }
    }

    fn row_will_display(&mut self, position: IndexPath) -> Cmd<FeedMsg> {
        if !self.controller.is_initialized() {
            debug!(%position, "retrying initial commit");
            return self.initialize();
        }
        match self
            .controller
            .on_row_about_to_display(position, &self.surface)
        {
            Some(pending) => schedule(pending),
            None => Cmd::none(),
        }
    }

    fn commit_ready(&mut self, pending: PendingCommit) -> Cmd<FeedMsg> {
        match self.controller.complete_commit(pending, &mut self.surface) {
            Ok(outcome) => self.committed(outcome),
            Err(err) => self.failed(err),
        }
    }

    fn committed(&mut self, outcome: CommitOutcome) -> Cmd<FeedMsg> {
        self.commits += 1;
        if outcome.indicator_removed {
            Cmd::log(format!(
                "all {} sections loaded",
                self.controller.total_sections()
            ))
        } else {
            Cmd::none()
        }
    }

    fn failed(&mut self, err: FeedError) -> Cmd<FeedMsg> {
        warn!(%err, retryable = err.is_retryable(), "commit did not apply");
        self.failures += 1;
        self.last_error = Some(err);
        Cmd::none()
    }
}

/// Turn a pending commit into a delayed background task.
fn schedule(pending: PendingCommit) -> Cmd<FeedMsg> {
    let spec = TaskSpec::after(pending.delay()).with_name(APPEND_TASK);
    Cmd::task_with_spec(spec, move || FeedMsg::CommitReady(pending))
}

impl<S: PresentationSurface> Model for FeedApp<S> {
    type Message = FeedMsg;

    fn init(&mut self) -> Cmd<Self::Message> {
        self.initialize()
    }

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
        match msg {
            FeedMsg::RowWillDisplay(position) => self.row_will_display(position),
            FeedMsg::CommitReady(pending) => self.commit_ready(pending),
            FeedMsg::Shutdown => Cmd::quit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollfeed_harness::RecordingSurface;
    use scrollfeed_runtime::simulator::{CmdRecord, ProgramSimulator};
    use std::time::Duration;

    fn sim() -> ProgramSimulator<FeedApp<RecordingSurface>> {
        let mut sim = ProgramSimulator::new(FeedApp::new(
            &FeedConfig::default(),
            RecordingSurface::new(),
        ));
        sim.init();
        sim
    }

    #[test]
    fn init_commits_without_tasks() {
        let sim = sim();
        assert_eq!(sim.model().surface().current_section_count(), 2);
        assert_eq!(sim.pending_tasks(), 0);
        assert_eq!(sim.model().commits(), 1);
    }

    #[test]
    fn trigger_schedules_named_delayed_task() {
        let mut sim = sim();
        sim.inject_event(Event::row(1, 9));
        assert_eq!(sim.pending_tasks(), 1);
        assert!(sim.model().controller().is_loading());
        assert!(sim.command_log().contains(&CmdRecord::TaskScheduled(
            TaskSpec::after(Duration::from_secs(1)).with_name(APPEND_TASK)
        )));
    }

    #[test]
    fn commit_lands_after_latency() {
        let mut sim = sim();
        sim.inject_event(Event::row(1, 9));
        sim.advance(Duration::from_millis(999));
        assert_eq!(sim.model().surface().current_section_count(), 2);
        sim.advance(Duration::from_millis(1));
        assert_eq!(sim.model().surface().current_section_count(), 4);
        assert_eq!(sim.model().controller().cursor(), 4);
        assert!(!sim.model().controller().is_loading());
    }

    #[test]
    fn shutdown_quits() {
        let mut sim = sim();
        sim.inject_event(Event::Shutdown);
        assert!(!sim.is_running());
    }

    #[test]
    fn failure_is_recorded_not_fatal() {
        let mut sim = sim();
        sim.model_mut().surface_mut().fail_next_apply("flaky");
        sim.inject_event(Event::row(1, 9));
        sim.run_pending_tasks();
        assert!(sim.is_running());
        assert_eq!(sim.model().failures(), 1);
        assert!(matches!(
            sim.model().last_error(),
            Some(FeedError::LoadFailed { .. })
        ));
        assert_eq!(sim.model().controller().cursor(), 2);
    }

    #[test]
    fn failed_init_retries_on_first_row() {
        let mut surface = RecordingSurface::new();
        surface.fail_next_apply("cold start");
        let mut sim = ProgramSimulator::new(FeedApp::new(&FeedConfig::default(), surface));
        sim.init();
        assert_eq!(sim.model().surface().current_section_count(), 0);
        assert_eq!(sim.model().failures(), 1);

        sim.inject_event(Event::row(0, 0));
        assert_eq!(sim.model().surface().current_section_count(), 2);
        assert!(sim.model().controller().is_initialized());
    }
}

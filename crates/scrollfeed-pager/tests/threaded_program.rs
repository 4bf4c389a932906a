//! Drive `FeedApp` through the threaded `Program` with real delays.
//!
//! The event source follows the surface: whenever a new pair of sections
//! lands it scrolls to the last loaded row, and it goes quiet once every
//! section is committed so the program can exit when idle.

use scrollfeed_core::{Event, FeedConfig, PresentationSurface, Snapshot, SurfaceError};
use scrollfeed_harness::RecordingSurface;
use scrollfeed_pager::FeedApp;
use scrollfeed_runtime::program::{EventSource, Program, ProgramConfig};
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Surface shared between the model and the test's event source.
#[derive(Clone, Default)]
struct SharedSurface(Arc<Mutex<RecordingSurface>>);

impl SharedSurface {
    fn with<R>(&self, f: impl FnOnce(&mut RecordingSurface) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }
}

impl PresentationSurface for SharedSurface {
    fn snapshot(&self) -> Snapshot {
        self.with(|s| s.snapshot())
    }

    fn current_section_count(&self) -> usize {
        self.with(|s| s.current_section_count())
    }

    fn apply(&mut self, snapshot: Snapshot, animate: bool) -> Result<(), SurfaceError> {
        self.with(|s| s.apply(snapshot, animate))
    }

    fn remove_loading_indicator(&mut self) {
        self.with(|s| s.remove_loading_indicator());
    }
}

/// Scrolls to the bottom each time the committed count grows.
struct Follower {
    surface: SharedSurface,
    page_size: usize,
    final_count: usize,
    scrolled_at: Option<usize>,
    deadline: Instant,
}

impl Follower {
    fn ready(&self) -> Option<usize> {
        let count = self.surface.current_section_count();
        (count > 0 && count < self.final_count && self.scrolled_at != Some(count)).then_some(count)
    }
}

impl EventSource for Follower {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.ready().is_some() {
            return Ok(true);
        }
        if !timeout.is_zero() {
            thread::sleep(timeout);
        }
        Ok(false)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        Ok(self.ready().map(|count| {
            self.scrolled_at = Some(count);
            Event::row(count - 1, self.page_size - 1)
        }))
    }

    fn is_exhausted(&self) -> bool {
        self.surface.current_section_count() >= self.final_count || Instant::now() > self.deadline
    }
}

fn run(total: usize, page: usize, latency: Duration) -> (FeedApp<SharedSurface>, String) {
    let config = FeedConfig::new()
        .total_sections(total)
        .page_size(page)
        .commit_latency(latency);
    let surface = SharedSurface::default();
    let events = Follower {
        surface: surface.clone(),
        page_size: page,
        final_count: total - total % 2,
        scrolled_at: None,
        deadline: Instant::now() + Duration::from_secs(10),
    };
    let mut program = Program::with_event_source(
        FeedApp::new(&config, surface),
        events,
        Vec::new(),
        ProgramConfig::default()
            .with_poll_timeout(Duration::from_millis(1))
            .with_exit_when_idle(true),
    );
    program.run().unwrap();
    let (app, out) = program.into_parts();
    (app, String::from_utf8(out).unwrap())
}

#[test]
fn loads_every_section_in_order() {
    let (app, out) = run(10, 10, Duration::from_millis(5));
    let surface = app.surface().clone();
    surface.with(|s| {
        assert_eq!(s.current_section_count(), 10);
        assert_eq!(s.indicator_removals(), 1);
        assert_eq!(
            s.applies().iter().map(|a| a.section_count).collect::<Vec<_>>(),
            vec![2, 4, 6, 8, 10]
        );
        assert!(s.applies().iter().all(|a| a.append_only && !a.animate));
        assert_eq!(s.committed().item_count(), 100);
    });
    assert_eq!(app.controller().cursor(), 10);
    assert!(!app.controller().is_loading());
    assert_eq!(app.commits(), 5);
    assert_eq!(out, "all 10 sections loaded\n");
}

#[test]
fn commit_lands_after_latency_not_before() {
    let latency = Duration::from_millis(40);
    let start = Instant::now();
    let (app, _) = run(4, 3, latency);
    assert!(start.elapsed() >= latency);
    assert_eq!(app.surface().current_section_count(), 4);
}

#[test]
fn odd_dataset_stops_one_short_without_removing_indicator() {
    let (app, out) = run(7, 2, Duration::ZERO);
    app.surface().with(|s| {
        assert_eq!(s.current_section_count(), 6);
        assert_eq!(s.indicator_removals(), 0);
        assert!(s.indicator_visible());
    });
    assert!(out.is_empty());
}

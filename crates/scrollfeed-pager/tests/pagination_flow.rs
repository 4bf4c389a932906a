//! End-to-end pagination scenarios driven through the simulator.

use scrollfeed_core::{Event, FeedConfig, PresentationSurface};
use scrollfeed_harness::{LOADING_FOOTER, RecordingSurface};
use scrollfeed_pager::FeedApp;
use scrollfeed_runtime::simulator::ProgramSimulator;
use std::time::Duration;

const LATENCY: Duration = Duration::from_secs(1);

fn started() -> ProgramSimulator<FeedApp<RecordingSurface>> {
    let mut sim = ProgramSimulator::new(FeedApp::new(
        &FeedConfig::default(),
        RecordingSurface::new(),
    ));
    sim.init();
    sim
}

/// Scroll to the last loaded row, the way a host would as the user reaches
/// the bottom of the list.
fn scroll_to_bottom(sim: &mut ProgramSimulator<FeedApp<RecordingSurface>>) {
    let committed = sim.model().surface().current_section_count();
    if committed == 0 {
        return;
    }
    for section in committed.saturating_sub(2)..committed {
        for row in 0..10 {
            sim.inject_event(Event::row(section, row));
        }
    }
}

#[test]
fn initial_state_shows_two_sections_and_footer() {
    let sim = started();
    let surface = sim.model().surface();
    assert_eq!(surface.committed().section_indices(), vec![0, 1]);
    assert_eq!(
        surface.to_text(),
        format!(
            "§0: 1 2 3 4 5 6 7 8 9 10\n§1: 11 12 13 14 15 16 17 18 19 20\n{LOADING_FOOTER}"
        )
    );
    assert_eq!(sim.model().controller().cursor(), 2);
    assert!(!sim.model().controller().is_loading());
}

#[test]
fn append_begins_and_completes() {
    let mut sim = started();
    sim.inject_event(Event::row(1, 9));
    assert!(sim.model().controller().is_loading());
    assert_eq!(sim.model().surface().current_section_count(), 2);

    sim.advance(LATENCY);
    let model = sim.model();
    assert_eq!(
        model.surface().committed().section_indices(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(model.controller().cursor(), 4);
    assert!(!model.controller().is_loading());
}

#[test]
fn burst_of_triggers_yields_one_commit() {
    let mut sim = started();
    for _ in 0..50 {
        sim.inject_event(Event::row(1, 9));
    }
    assert_eq!(sim.pending_tasks(), 1);

    sim.advance(LATENCY / 2);
    for _ in 0..50 {
        sim.inject_event(Event::row(1, 9));
    }
    assert_eq!(sim.pending_tasks(), 1);

    sim.run_pending_tasks();
    assert_eq!(sim.model().surface().apply_count(), 2);
    assert_eq!(sim.model().surface().current_section_count(), 4);
}

#[test]
fn scrolling_to_the_end_loads_everything_once() {
    let mut sim = started();
    for _ in 0..10 {
        scroll_to_bottom(&mut sim);
        sim.advance(LATENCY);
    }

    let model = sim.model();
    let surface = model.surface();
    assert_eq!(surface.current_section_count(), 10);
    assert_eq!(model.controller().cursor(), 10);
    assert_eq!(surface.indicator_removals(), 1);
    assert!(!surface.indicator_visible());
    assert_eq!(
        surface
            .applies()
            .iter()
            .map(|a| a.section_count)
            .collect::<Vec<_>>(),
        vec![2, 4, 6, 8, 10]
    );
    assert!(surface.applies().iter().all(|a| a.append_only && !a.animate));
    assert_eq!(sim.logs(), &["all 10 sections loaded".to_string()]);

    // Further triggers are no-ops.
    scroll_to_bottom(&mut sim);
    sim.inject_event(Event::row(9, 9));
    assert_eq!(sim.pending_tasks(), 0);
    assert_eq!(sim.model().surface().indicator_removals(), 1);
}

#[test]
fn commits_apply_in_trigger_order_with_no_overlap() {
    let mut sim = started();
    let mut seen = Vec::new();
    for _ in 0..4 {
        scroll_to_bottom(&mut sim);
        assert!(sim.pending_tasks() <= 1);
        sim.run_pending_tasks();
        seen.push(
            sim.model()
                .surface()
                .applies()
                .last()
                .map(|a| a.appended.clone())
                .unwrap_or_default(),
        );
    }
    assert_eq!(
        seen,
        vec![vec![2, 3], vec![4, 5], vec![6, 7], vec![8, 9]]
    );
}

#[test]
fn failure_then_retry_through_the_app() {
    let mut sim = started();
    sim.model_mut().surface_mut().fail_next_apply("offline");

    sim.inject_event(Event::row(1, 9));
    sim.advance(LATENCY);
    assert_eq!(sim.model().failures(), 1);
    assert_eq!(sim.model().surface().current_section_count(), 2);
    assert!(!sim.model().controller().is_loading());

    sim.inject_event(Event::row(1, 9));
    sim.advance(LATENCY);
    assert_eq!(sim.model().surface().current_section_count(), 4);
    assert_eq!(sim.model().surface().rejected_count(), 1);
}

#[test]
fn small_config_with_zero_latency() {
    let config = FeedConfig::new()
        .total_sections(4)
        .page_size(2)
        .commit_latency(Duration::ZERO);
    let mut sim = ProgramSimulator::new(FeedApp::new(&config, RecordingSurface::new()));
    sim.init();
    sim.inject_event(Event::row(1, 1));
    assert_eq!(sim.advance(Duration::ZERO), 1);
    assert_eq!(
        sim.model().surface().to_text(),
        "§0: 1 2\n§1: 3 4\n§2: 5 6\n§3: 7 8"
    );
}

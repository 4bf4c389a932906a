#![forbid(unsafe_code)]

//! Scripted scrolling.
//!
//! [`AutoScroller`] walks every row of the list in order at a fixed pace,
//! emitting [`Event::RowWillDisplay`] for each. When it catches up with the
//! committed content it waits for the next append; if none arrives within the
//! stall window it re-displays the last loaded row, which retries a failed
//! commit. Once every loadable row has been shown it emits
//! [`Event::Shutdown`].

use crate::terminal_surface::CommitCounter;
use scrollfeed_core::{Event, FeedConfig, IndexPath};
use scrollfeed_runtime::program::EventSource;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Sections a controller will ever commit for a dataset of `total`.
///
/// Appends come in pairs, so a trailing odd section is never shown; a
/// single-section dataset is committed whole by the initial load.
#[must_use]
pub fn loadable_sections(total: usize) -> usize {
    if total < 2 { total } else { total - total % 2 }
}

/// Event source that scrolls through the list like a reader would.
#[derive(Debug)]
pub struct AutoScroller {
    counter: CommitCounter,
    page_size: usize,
    final_count: usize,
    interval: Duration,
    stall_retry: Duration,
    next: IndexPath,
    next_at: Instant,
    waiting_since: Option<Instant>,
    pending: Option<Event>,
    shutdown_sent: bool,
}

impl AutoScroller {
    /// Scroll the list described by `config`, one row per `interval`.
    ///
    /// The stall window defaults to twice the commit latency plus half a
    /// second.
    #[must_use]
    pub fn new(counter: CommitCounter, config: &FeedConfig, interval: Duration) -> Self {
        Self {
            counter,
            page_size: config.page_size,
            final_count: loadable_sections(config.total_sections),
            interval,
            stall_retry: config.commit_latency * 2 + Duration::from_millis(500),
            next: IndexPath::new(0, 0),
            next_at: Instant::now(),
            waiting_since: None,
            pending: None,
            shutdown_sent: false,
        }
    }

    #[must_use]
    pub fn with_stall_retry(mut self, stall_retry: Duration) -> Self {
        self.stall_retry = stall_retry;
        self
    }

    /// Next row this scroller will display.
    pub fn position(&self) -> IndexPath {
        self.next
    }

    fn next_event(&mut self, now: Instant) -> Option<Event> {
        if self.shutdown_sent {
            return None;
        }
        if self.page_size == 0 || self.next.section >= self.final_count {
            return Some(Event::Shutdown);
        }

        let committed = self.counter.get();
        if self.next.section < committed {
            return (now >= self.next_at).then_some(Event::RowWillDisplay(self.next));
        }

        // Caught up with the loaded content.
        match self.waiting_since {
            None => {
                self.waiting_since = Some(now);
                None
            }
            Some(since) if committed > 0 && now.duration_since(since) >= self.stall_retry => {
                self.waiting_since = Some(now);
                Some(Event::row(committed - 1, self.page_size - 1))
            }
            Some(_) => None,
        }
    }

    fn advance(&mut self, shown: IndexPath) {
        if shown != self.next {
            return;
        }
        self.next = if shown.row + 1 < self.page_size {
            IndexPath::new(shown.section, shown.row + 1)
        } else {
            IndexPath::new(shown.section + 1, 0)
        };
        self.next_at = Instant::now() + self.interval;
        self.waiting_since = None;
    }
}

impl EventSource for AutoScroller {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.pending.is_none() {
            self.pending = self.next_event(Instant::now());
        }
        if self.pending.is_some() {
            return Ok(true);
        }
        if !timeout.is_zero() {
            let until_next = self.next_at.saturating_duration_since(Instant::now());
            let nap = if until_next.is_zero() { timeout } else { timeout.min(until_next) };
            thread::sleep(nap);
        }
        Ok(false)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        let event = self.pending.take();
        match event {
            Some(Event::RowWillDisplay(position)) => self.advance(position),
            Some(Event::Shutdown) => self.shutdown_sent = true,
            None => {}
        }
        Ok(event)
    }

    fn is_exhausted(&self) -> bool {
        self.shutdown_sent
    }
}

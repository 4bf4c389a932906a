#![forbid(unsafe_code)]

//! Presentation surface that prints to a terminal.
//!
//! Each apply prints only the sections that are new relative to what is
//! already on screen, so earlier rows never move. While more sections may
//! arrive a dim footer line sits under the last row; it is erased before new
//! rows are printed and for good once the list is complete.

use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{cursor, queue, terminal};
use scrollfeed_core::{PresentationSurface, Snapshot, SurfaceError};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Footer text shown while more sections may load.
pub const LOADING_FOOTER: &str = "  … loading more";

/// Committed section count, readable from other threads.
#[derive(Debug, Clone, Default)]
pub struct CommitCounter(Arc<AtomicUsize>);

impl CommitCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, count: usize) {
        self.0.store(count, Ordering::Release);
    }
}

/// A [`PresentationSurface`] over any writer, normally stdout.
pub struct TerminalSurface<W: Write> {
    out: W,
    committed: Snapshot,
    counter: CommitCounter,
    footer_drawn: bool,
    indicator_visible: bool,
}

impl<W: Write> TerminalSurface<W> {
    /// Create a surface and draw the loading footer.
    ///
    /// # Errors
    ///
    /// Propagates write failures on `out`.
    pub fn new(out: W, counter: CommitCounter) -> io::Result<Self> {
        let mut surface = Self {
            out,
            committed: Snapshot::new(),
            counter,
            footer_drawn: false,
            indicator_visible: true,
        };
        surface.draw_footer()?;
        surface.out.flush()?;
        Ok(surface)
    }

    pub fn counter(&self) -> &CommitCounter {
        &self.counter
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    /// Write a fully rendered frame in one call so a failed write never
    /// leaves half an append on screen.
    fn present(&mut self, frame: &[u8]) -> io::Result<()> {
        self.out.write_all(frame)?;
        self.out.flush()
    }

    fn draw_footer(&mut self) -> io::Result<()> {
        if self.footer_drawn || !self.indicator_visible {
            return Ok(());
        }
        let mut frame = Vec::new();
        queue_footer(&mut frame)?;
        self.present(&frame)?;
        self.footer_drawn = true;
        Ok(())
    }
}

fn queue_footer(frame: &mut Vec<u8>) -> io::Result<()> {
    queue!(
        frame,
        SetAttribute(Attribute::Dim),
        Print(LOADING_FOOTER),
        SetAttribute(Attribute::Reset),
        Print("\r\n")
    )
}

fn queue_erase_footer(frame: &mut Vec<u8>) -> io::Result<()> {
    queue!(
        frame,
        cursor::MoveToPreviousLine(1),
        terminal::Clear(terminal::ClearType::CurrentLine)
    )
}

fn queue_sections(frame: &mut Vec<u8>, snapshot: &Snapshot, from: usize) -> io::Result<()> {
    for section in &snapshot.sections()[from..] {
        queue!(
            frame,
            SetForegroundColor(Color::Cyan),
            SetAttribute(Attribute::Bold),
            Print(format!("Section {}", section.index())),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Print("\r\n")
        )?;
        for item in section.items().iter() {
            queue!(frame, Print(format!("  {item}\r\n")))?;
        }
    }
    Ok(())
}

impl<W: Write> PresentationSurface for TerminalSurface<W> {
    fn snapshot(&self) -> Snapshot {
        self.committed.clone()
    }

    fn current_section_count(&self) -> usize {
        self.committed.section_count()
    }

    fn apply(&mut self, snapshot: Snapshot, animate: bool) -> Result<(), SurfaceError> {
        if !snapshot.extends(&self.committed) {
            return Err(SurfaceError::Rejected(
                "snapshot does not extend the rows on screen".to_string(),
            ));
        }
        if animate {
            debug!("terminal surface does not animate; applying directly");
        }

        let mut frame = Vec::new();
        if self.footer_drawn {
            queue_erase_footer(&mut frame)?;
        }
        queue_sections(&mut frame, &snapshot, self.committed.section_count())?;
        if self.indicator_visible {
            queue_footer(&mut frame)?;
        }
        // On failure nothing below runs, so footer and committed state still
        // describe the screen before this apply.
        self.present(&frame)?;

        self.footer_drawn = self.indicator_visible;
        self.committed = snapshot;
        self.counter.set(self.committed.section_count());
        Ok(())
    }

    fn remove_loading_indicator(&mut self) {
        self.indicator_visible = false;
        if !self.footer_drawn {
            return;
        }
        let mut frame = Vec::new();
        match queue_erase_footer(&mut frame).and_then(|()| self.present(&frame)) {
            Ok(()) => self.footer_drawn = false,
            Err(err) => warn!(%err, "failed to erase loading footer"),
        }
    }
}

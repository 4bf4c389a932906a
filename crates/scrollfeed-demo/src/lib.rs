#![forbid(unsafe_code)]

//! Terminal demo for scrollfeed.
//!
//! A [`scroller::AutoScroller`] plays the part of a user flicking through the
//! list; a [`terminal_surface::TerminalSurface`] prints each committed pair of
//! sections to the terminal with a loading footer underneath.

pub mod cli;
pub mod scroller;
pub mod terminal_surface;

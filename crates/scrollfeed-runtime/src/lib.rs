#![forbid(unsafe_code)]

//! scrollfeed Runtime
//!
//! Elm-style update loop with background tasks.
//!
//! # Key Components
//!
//! - [`Model`] - Trait for application state and behavior
//! - [`Cmd`] - Commands for side effects
//! - [`TaskSpec`] - Name and start delay of a background task
//! - [`Program`] - Runtime loop: host events in, task results back onto the
//!   owning thread through a single-consumer channel
//! - [`ProgramSimulator`] - Deterministic driver with a virtual clock
//!
//! # Role in scrollfeed
//! The runtime is the single owner of model state. Background tasks never
//! touch the model; they return a message that the loop feeds back through
//! [`Model::update`], so every state transition happens on one thread.

pub mod program;
pub mod simulator;

pub use program::{
    Cmd, EventSource, HeadlessEventSource, Model, Program, ProgramConfig, TaskSpec,
};
pub use simulator::{CmdRecord, ProgramSimulator};

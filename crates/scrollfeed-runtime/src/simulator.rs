#![forbid(unsafe_code)]

//! Deterministic program simulator for testing.
//!
//! `ProgramSimulator` runs a [`Model`] without threads or real time. Host
//! events and messages are dispatched synchronously; background tasks are
//! parked on a virtual clock and only run when the test advances it. This
//! makes "trigger while a task is in flight" sequences reproducible.
//!
//! # Example
//!
//! ```ignore
//! use scrollfeed_runtime::simulator::ProgramSimulator;
//!
//! let mut sim = ProgramSimulator::new(model);
//! sim.init();
//! sim.inject_event(Event::row(1, 9));
//! assert_eq!(sim.pending_tasks(), 1);
//! sim.advance(Duration::from_secs(1));
//! assert_eq!(sim.pending_tasks(), 0);
//! ```

use crate::program::{Cmd, Model, TaskSpec};
use scrollfeed_core::Event;
use std::time::Duration;

/// Record of a command that was executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    /// No-op command.
    None,
    /// Quit command.
    Quit,
    /// Message sent to model (not stored, just noted).
    Msg,
    /// Batch of commands.
    Batch(usize),
    /// Sequence of commands.
    Sequence(usize),
    /// Log message emitted.
    Log(String),
    /// Background task parked on the virtual clock.
    TaskScheduled(TaskSpec),
    /// Parked task ran and its message was dispatched.
    TaskCompleted(Option<String>),
}

struct ParkedTask<Msg> {
    due: Duration,
    seq: u64,
    spec: TaskSpec,
    body: Box<dyn FnOnce() -> Msg + Send>,
}

/// Deterministic simulator for [`Model`] testing.
pub struct ProgramSimulator<M: Model> {
    /// The application model.
    model: M,
    /// Record of all executed commands.
    command_log: Vec<CmdRecord>,
    /// Whether the simulated program is still running.
    running: bool,
    /// Log messages emitted via Cmd::Log.
    logs: Vec<String>,
    /// Tasks waiting for the virtual clock.
    parked: Vec<ParkedTask<M::Message>>,
    /// Virtual time since construction.
    now: Duration,
    /// Tie-breaker so tasks due at the same instant run in spawn order.
    next_seq: u64,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a new simulator with the given model.
    ///
    /// The model is not initialized until [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self {
            model,
            command_log: Vec::new(),
            running: true,
            logs: Vec::new(),
            parked: Vec::new(),
            now: Duration::ZERO,
            next_seq: 0,
        }
    }

    /// Initialize the model by calling `Model::init()` and executing returned commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Inject host events into the model.
    ///
    /// Each event is converted to a message via `From<Event>` and dispatched
    /// through `Model::update()`. Virtual time does not move.
    pub fn inject_events(&mut self, events: &[Event]) {
        for event in events {
            if !self.running {
                break;
            }
            let msg = M::Message::from(*event);
            let cmd = self.model.update(msg);
            self.execute_cmd(cmd);
        }
    }

    /// Inject a single host event into the model.
    pub fn inject_event(&mut self, event: Event) {
        self.inject_events(&[event]);
    }

    /// Send a specific message to the model.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Move the virtual clock forward by `duration`, running every parked
    /// task that comes due (including tasks spawned by those tasks, if they
    /// fall inside the window). Returns the number of tasks run.
    pub fn advance(&mut self, duration: Duration) -> usize {
        let target = self.now.saturating_add(duration);
        let mut ran = 0;
        while self.running {
            let Some(pos) = self.next_due(target) else {
                break;
            };
            self.run_parked(pos);
            ran += 1;
        }
        self.now = self.now.max(target);
        ran
    }

    /// Run parked tasks in due order until none remain, jumping the clock to
    /// each due time. Returns the number of tasks run.
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut ran = 0;
        while self.running {
            let Some(pos) = self.next_due(Duration::MAX) else {
                break;
            };
            self.run_parked(pos);
            ran += 1;
        }
        ran
    }

    /// Number of tasks waiting on the virtual clock.
    pub fn pending_tasks(&self) -> usize {
        self.parked.len()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Get a reference to the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Check if the simulated program is still running.
    ///
    /// Returns `false` after a `Cmd::Quit` has been executed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get all log messages emitted via `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Get the command execution log.
    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Clear all logs.
    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    fn next_due(&self, limit: Duration) -> Option<usize> {
        self.parked
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due <= limit)
            .min_by_key(|(_, task)| (task.due, task.seq))
            .map(|(pos, _)| pos)
    }

    fn run_parked(&mut self, pos: usize) {
        let task = self.parked.swap_remove(pos);
        self.now = self.now.max(task.due);
        self.command_log.push(CmdRecord::TaskCompleted(task.spec.name));
        let msg = (task.body)();
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Execute a command without threads.
    ///
    /// Cmd::Msg recurses through update; Cmd::Log records the text;
    /// Cmd::Task is parked until the virtual clock reaches its delay.
    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {
                self.command_log.push(CmdRecord::None);
            }
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Sequence(cmds) => {
                self.command_log.push(CmdRecord::Sequence(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
            Cmd::Task(spec, body) => {
                self.command_log.push(CmdRecord::TaskScheduled(spec.clone()));
                let seq = self.next_seq;
                self.next_seq += 1;
                self.parked.push(ParkedTask {
                    due: self.now.saturating_add(spec.delay),
                    seq,
                    spec,
                    body,
                });
            }
        }
    }
}

#![forbid(unsafe_code)]

//! Elm-style runtime for paginated list hosts.
//!
//! The program runtime owns the model, feeds it host events, and executes
//! the commands it returns. Side effects that take time run as background
//! tasks; their results come back as messages over a channel and are applied
//! on the loop thread, never concurrently with another update.
//!
//! # Example
//!
//! ```ignore
//! use scrollfeed_core::Event;
//! use scrollfeed_runtime::program::{Cmd, Model};
//!
//! struct Loader {
//!     loaded: usize,
//! }
//!
//! enum Msg {
//!     Row,
//!     Loaded(usize),
//!     Quit,
//! }
//!
//! impl From<Event> for Msg {
//!     fn from(event: Event) -> Self {
//!         match event {
//!             Event::RowWillDisplay(_) => Msg::Row,
//!             Event::Shutdown => Msg::Quit,
//!         }
//!     }
//! }
//!
//! impl Model for Loader {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
//!         match msg {
//!             Msg::Row => Cmd::task_after(Duration::from_millis(50), || Msg::Loaded(10)),
//!             Msg::Loaded(n) => { self.loaded += n; Cmd::none() }
//!             Msg::Quit => Cmd::quit(),
//!         }
//!     }
//! }
//! ```

use scrollfeed_core::Event;
use std::collections::VecDeque;
use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, error, info_span};

/// The Model trait defines application state and behavior.
///
/// Implementations define how the application responds to host events and
/// task results.
pub trait Model: Sized {
    /// The message type for this model.
    ///
    /// Must be convertible from host events and sendable from task threads.
    type Message: From<Event> + Send + 'static;

    /// Initialize the model with startup commands.
    ///
    /// Called once when the program starts.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Update the model in response to a message.
    ///
    /// This is the only place model state changes. Returns commands for any
    /// side effects that should be executed.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;
}

/// Scheduling metadata for background tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSpec {
    /// Optional task name for diagnostics and thread naming.
    pub name: Option<String>,
    /// Time to wait before running the task body.
    pub delay: Duration,
}

impl TaskSpec {
    /// Create a task spec that starts after `delay`.
    #[must_use]
    pub fn after(delay: Duration) -> Self {
        Self { name: None, delay }
    }

    /// Attach a task name for diagnostics.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("task")
    }
}

/// Commands represent side effects to be executed by the runtime.
///
/// Commands are returned from `init()` and `update()`.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Quit the application.
    Quit,
    /// Execute multiple commands as a batch (currently sequential).
    Batch(Vec<Cmd<M>>),
    /// Execute commands sequentially.
    Sequence(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Write a log line to the program's output.
    Log(String),
    /// Run a blocking operation on a background thread.
    ///
    /// The thread waits `TaskSpec::delay`, runs the closure, and sends the
    /// returned message back to the model's `update()`. Tasks are never
    /// cancelled; each one delivers exactly one message.
    Task(TaskSpec, Box<dyn FnOnce() -> M + Send>),
}

impl<M: std::fmt::Debug> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
            Self::Task(spec, _) => f.debug_struct("Task").field("spec", spec).finish(),
        }
    }
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a quit command.
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Create a message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a log command.
    ///
    /// A newline is appended if not present.
    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Create a batch of commands.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds = cmds;
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a sequence of commands.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        let mut cmds = cmds;
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or_default(),
            _ => Self::Sequence(cmds),
        }
    }

    /// Return a stable name for telemetry and tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Sequence(_) => "Sequence",
            Self::Msg(_) => "Msg",
            Self::Log(_) => "Log",
            Self::Task(..) => "Task",
        }
    }

    /// Create a background task command that runs immediately.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default(), Box::new(f))
    }

    /// Create a background task command with explicit scheduling metadata.
    pub fn task_with_spec<F>(spec: TaskSpec, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(spec, Box::new(f))
    }

    /// Create a background task command that starts after `delay`.
    pub fn task_after<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::after(delay), Box::new(f))
    }

    /// Create a named background task command.
    pub fn task_named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default().with_name(name), Box::new(f))
    }

    /// Count the number of atomic commands in this command.
    ///
    /// Returns 0 for None, 1 for atomic commands, and recursively counts for Batch/Sequence.
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) | Self::Sequence(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }
}

/// Configuration for the program runtime.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Event poll timeout. Bounds how long a finished task result waits
    /// before the loop picks it up.
    pub poll_timeout: Duration,
    /// Stop once the event source is exhausted and no task is outstanding.
    pub exit_when_idle: bool,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(16),
            exit_when_idle: false,
        }
    }
}

impl ProgramConfig {
    /// Set the event poll timeout.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Stop when there is nothing left to do.
    #[must_use]
    pub fn with_exit_when_idle(mut self, exit: bool) -> Self {
        self.exit_when_idle = exit;
        self
    }
}

/// Source of host events for the runtime loop.
pub trait EventSource {
    /// Wait up to `timeout` for an event. Returns `true` if one is ready.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Take the next ready event, if any.
    fn read_event(&mut self) -> io::Result<Option<Event>>;

    /// Whether the source will never produce another event.
    fn is_exhausted(&self) -> bool {
        false
    }
}

// =============================================================================
// HeadlessEventSource: scripted event source for headless/test programs
// =============================================================================

/// A scripted event source for headless and test programs.
///
/// Replays a fixed queue of events. Once drained it reports itself exhausted
/// and polls sleep for the timeout so an idle loop does not spin.
#[derive(Debug, Default)]
pub struct HeadlessEventSource {
    queue: VecDeque<Event>,
}

impl HeadlessEventSource {
    /// Create a source that replays `events` in order.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    /// Append an event to the end of the script.
    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for HeadlessEventSource {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.queue.is_empty() {
            if !timeout.is_zero() {
                thread::sleep(timeout);
            }
            return Ok(false);
        }
        Ok(true)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        Ok(self.queue.pop_front())
    }

    fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }
}

// =============================================================================
// Program
// =============================================================================

/// The program runtime that manages the update loop.
pub struct Program<M: Model, E: EventSource, W: Write = Stdout> {
    /// The application model.
    model: M,
    /// Host event source.
    events: E,
    /// Destination for `Cmd::Log` lines.
    writer: W,
    /// Whether the program is running.
    running: bool,
    /// Runtime configuration.
    config: ProgramConfig,
    /// Channel for receiving background task results.
    task_receiver: mpsc::Receiver<M::Message>,
    /// Sender handed to each spawned task.
    task_sender: mpsc::Sender<M::Message>,
    /// Join handles for background tasks; reaped periodically.
    task_handles: Vec<JoinHandle<()>>,
    /// Tasks spawned whose result has not been processed yet.
    outstanding_tasks: usize,
}

impl<M: Model> Program<M, HeadlessEventSource, Vec<u8>> {
    /// Create a headless program that replays `events` and captures log
    /// output in memory. Stops once events are drained and tasks settle.
    pub fn headless(model: M, events: impl IntoIterator<Item = Event>) -> Self {
        Self::with_event_source(
            model,
            HeadlessEventSource::new(events),
            Vec::new(),
            ProgramConfig::default()
                .with_poll_timeout(Duration::from_millis(1))
                .with_exit_when_idle(true),
        )
    }
}

impl<M: Model, E: EventSource, W: Write> Program<M, E, W> {
    /// Create a program with an externally-constructed event source and writer.
    pub fn with_event_source(model: M, events: E, writer: W, config: ProgramConfig) -> Self {
        let (task_sender, task_receiver) = mpsc::channel();
        Self {
            model,
            events,
            writer,
            running: true,
            config,
            task_receiver,
            task_sender,
            task_handles: Vec::new(),
            outstanding_tasks: 0,
        }
    }

    /// Run the main event loop until `Cmd::Quit`, or until idle when
    /// `exit_when_idle` is set.
    ///
    /// Outstanding tasks are joined before returning; their results are
    /// discarded.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.run_event_loop();
        self.join_tasks();
        result
    }

    /// Get a reference to the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Get a reference to the log writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Check if the program is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Consume the program, returning the model and writer.
    pub fn into_parts(mut self) -> (M, W) {
        self.join_tasks();
        (self.model, self.writer)
    }

    fn run_event_loop(&mut self) -> io::Result<()> {
        let cmd = {
            let _span = info_span!("scrollfeed.program.init").entered();
            self.model.init()
        };
        self.execute_cmd(cmd)?;

        while self.running {
            let timeout = self.config.poll_timeout;

            if self.events.poll_event(timeout)? {
                // Drain all pending events
                loop {
                    if let Some(event) = self.events.read_event()? {
                        self.handle_event(event)?;
                    }
                    if !self.running || !self.events.poll_event(Duration::ZERO)? {
                        break;
                    }
                }
            }

            self.process_task_results()?;
            self.reap_finished_tasks();

            if self.config.exit_when_idle
                && self.outstanding_tasks == 0
                && self.events.is_exhausted()
            {
                debug!("program idle; stopping");
                self.running = false;
            }
        }
        self.writer.flush()
    }

    fn handle_event(&mut self, event: Event) -> io::Result<()> {
        let cmd = {
            let _span = debug_span!(
                "scrollfeed.program.update",
                msg_type = event.type_name(),
                duration_us = tracing::field::Empty,
                cmd_type = tracing::field::Empty
            )
            .entered();
            let start = Instant::now();
            let cmd = self.model.update(M::Message::from(event));
            tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
            tracing::Span::current().record("cmd_type", cmd.type_name());
            cmd
        };
        self.execute_cmd(cmd)
    }

    /// Process results from background tasks.
    fn process_task_results(&mut self) -> io::Result<()> {
        while let Ok(msg) = self.task_receiver.try_recv() {
            self.outstanding_tasks = self.outstanding_tasks.saturating_sub(1);
            let cmd = {
                let _span = debug_span!(
                    "scrollfeed.program.update",
                    msg_type = "task",
                    duration_us = tracing::field::Empty,
                    cmd_type = tracing::field::Empty
                )
                .entered();
                let start = Instant::now();
                let cmd = self.model.update(msg);
                tracing::Span::current().record("duration_us", start.elapsed().as_micros() as u64);
                tracing::Span::current().record("cmd_type", cmd.type_name());
                cmd
            };
            self.execute_cmd(cmd)?;
            if !self.running {
                break;
            }
        }
        Ok(())
    }

    /// Execute a command.
    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) -> io::Result<()> {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute_cmd(cmd)?;
            }
            Cmd::Batch(cmds) | Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute_cmd(c)?;
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::Log(text) => {
                if text.ends_with('\n') {
                    self.writer.write_all(text.as_bytes())?;
                } else {
                    writeln!(self.writer, "{text}")?;
                }
            }
            Cmd::Task(spec, f) => self.spawn_task(spec, f)?,
        }
        Ok(())
    }

    fn spawn_task(
        &mut self,
        spec: TaskSpec,
        f: Box<dyn FnOnce() -> M::Message + Send>,
    ) -> io::Result<()> {
        debug!(task = spec.label(), delay_ms = spec.delay.as_millis() as u64, "spawning task");
        let sender = self.task_sender.clone();
        let thread_name = format!("scrollfeed-{}", spec.label());
        let delay = spec.delay;
        let handle = thread::Builder::new().name(thread_name).spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            let msg = f();
            let _ = sender.send(msg);
        })?;
        self.task_handles.push(handle);
        self.outstanding_tasks += 1;
        Ok(())
    }

    fn reap_finished_tasks(&mut self) {
        if self.task_handles.is_empty() {
            return;
        }

        let mut remaining = Vec::with_capacity(self.task_handles.len());
        for handle in self.task_handles.drain(..) {
            if handle.is_finished() {
                if let Err(payload) = handle.join() {
                    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                        (*s).to_owned()
                    } else if let Some(s) = payload.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic payload".to_owned()
                    };
                    error!("spawned task panicked: {msg}");
                    // A panicked task never sends its result.
                    self.outstanding_tasks = self.outstanding_tasks.saturating_sub(1);
                }
            } else {
                remaining.push(handle);
            }
        }
        self.task_handles = remaining;
    }

    fn join_tasks(&mut self) {
        for handle in self.task_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum TaskMsg {
        Row,
        Done(usize),
        Panic,
        Quit,
    }

    impl From<Event> for TaskMsg {
        fn from(event: Event) -> Self {
            match event {
                Event::RowWillDisplay(path) if path.row == usize::MAX => TaskMsg::Panic,
                Event::RowWillDisplay(_) => TaskMsg::Row,
                Event::Shutdown => TaskMsg::Quit,
            }
        }
    }

    #[derive(Default)]
    struct TaskModel {
        started: usize,
        results: Vec<usize>,
        thread_ids: Vec<thread::ThreadId>,
    }

    impl Model for TaskModel {
        type Message = TaskMsg;

        fn init(&mut self) -> Cmd<Self::Message> {
            Cmd::log("ready")
        }

        fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
            self.thread_ids.push(thread::current().id());
            match msg {
                TaskMsg::Row => {
                    self.started += 1;
                    let n = self.started;
                    Cmd::task_after(Duration::from_millis(5), move || TaskMsg::Done(n))
                }
                TaskMsg::Done(n) => {
                    self.results.push(n);
                    Cmd::log(format!("done {n}"))
                }
                TaskMsg::Panic => Cmd::task_named("boom", || panic!("task exploded")),
                TaskMsg::Quit => Cmd::quit(),
            }
        }
    }

    fn output(program: &Program<TaskModel, HeadlessEventSource, Vec<u8>>) -> String {
        String::from_utf8_lossy(program.writer()).into_owned()
    }

    #[test]
    fn cmd_constructors_collapse() {
        assert!(matches!(Cmd::<u8>::batch(vec![]), Cmd::None));
        assert!(matches!(Cmd::batch(vec![Cmd::<u8>::Quit]), Cmd::Quit));
        assert!(matches!(
            Cmd::sequence(vec![Cmd::<u8>::Quit, Cmd::None]),
            Cmd::Sequence(_)
        ));
        assert_eq!(
            Cmd::batch(vec![Cmd::msg(1u8), Cmd::Batch(vec![Cmd::quit(), Cmd::none()])]).count(),
            2
        );
    }

    #[test]
    fn cmd_debug_hides_task_body() {
        let cmd: Cmd<u8> = Cmd::task_with_spec(
            TaskSpec::after(Duration::from_millis(3)).with_name("load"),
            || 1,
        );
        let text = format!("{cmd:?}");
        assert!(text.contains("load"));
        assert_eq!(cmd.type_name(), "Task");
    }

    #[test]
    fn task_results_return_to_loop_thread() {
        let mut program = Program::headless(
            TaskModel::default(),
            [Event::row(0, 0), Event::row(0, 1)],
        );
        program.run().unwrap();

        let model = program.model();
        let mut results = model.results.clone();
        results.sort_unstable();
        assert_eq!(results, vec![1, 2]);

        let loop_thread = thread::current().id();
        assert!(model.thread_ids.iter().all(|id| *id == loop_thread));

        let out = output(&program);
        assert!(out.starts_with("ready\n"));
        assert!(out.contains("done 1\n"));
        assert!(out.contains("done 2\n"));
    }

    #[test]
    fn shutdown_event_quits_before_later_events() {
        let mut program = Program::headless(
            TaskModel::default(),
            [Event::Shutdown, Event::row(0, 0)],
        );
        program.run().unwrap();
        assert!(!program.is_running());
        assert_eq!(program.model().started, 0);
    }

    #[test]
    fn panicking_task_does_not_wedge_idle_exit() {
        let mut program = Program::headless(
            TaskModel::default(),
            [Event::row(0, usize::MAX)],
        );
        program.run().unwrap();
        assert!(!program.is_running());
        assert!(program.model().results.is_empty());
    }

    #[test]
    fn delayed_task_waits_for_delay() {
        let counter = Arc::new(AtomicUsize::new(0));

        struct Delayed {
            counter: Arc<AtomicUsize>,
            elapsed: Option<Duration>,
            started: Instant,
        }

        impl Model for Delayed {
            type Message = TaskMsg;

            fn init(&mut self) -> Cmd<Self::Message> {
                let counter = Arc::clone(&self.counter);
                Cmd::task_after(Duration::from_millis(30), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    TaskMsg::Done(0)
                })
            }

            fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
                if let TaskMsg::Done(_) = msg {
                    self.elapsed = Some(self.started.elapsed());
                }
                Cmd::none()
            }
        }

        let mut program = Program::headless(
            Delayed {
                counter: Arc::clone(&counter),
                elapsed: None,
                started: Instant::now(),
            },
            [],
        );
        program.run().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(program.model().elapsed.unwrap() >= Duration::from_millis(30));
    }

    #[test]
    fn headless_source_reports_exhaustion() {
        let mut source = HeadlessEventSource::new([Event::Shutdown]);
        assert!(!source.is_exhausted());
        assert!(source.poll_event(Duration::ZERO).unwrap());
        assert_eq!(source.read_event().unwrap(), Some(Event::Shutdown));
        assert!(source.is_exhausted());
        assert!(!source.poll_event(Duration::ZERO).unwrap());
        source.push(Event::row(1, 1));
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn into_parts_returns_model_and_output() {
        let mut program = Program::headless(TaskModel::default(), []);
        program.run().unwrap();
        let (model, out) = program.into_parts();
        assert_eq!(model.started, 0);
        assert_eq!(out, b"ready\n");
    }
}

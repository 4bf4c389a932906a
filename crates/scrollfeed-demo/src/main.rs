#![forbid(unsafe_code)]

//! scrollfeed demo binary entry point.

use scrollfeed_core::FeedConfig;
use scrollfeed_demo::cli::{self, CliAction};
use scrollfeed_demo::scroller::AutoScroller;
use scrollfeed_demo::terminal_surface::{CommitCounter, TerminalSurface};
use scrollfeed_pager::FeedApp;
use scrollfeed_runtime::{Program, ProgramConfig};
use std::io;
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // Log lines share the terminal with the list; keep them quiet by default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let opts = match cli::Opts::parse() {
        Ok(CliAction::Run(opts)) => opts,
        Ok(CliAction::Help) => {
            println!("{}", cli::HELP_TEXT);
            return;
        }
        Ok(CliAction::Version) => {
            println!("scrollfeed-demo {}", cli::VERSION);
            return;
        }
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(1);
        }
    };

    init_tracing();

    let config = opts.apply_to(FeedConfig::from_env());
    if let Err(error) = config.check_capacity() {
        eprintln!("Invalid configuration: {error}");
        process::exit(1);
    }
    if let Err(errors) = config.validate() {
        for error in &errors {
            warn!(%error, "questionable configuration");
        }
    }
    info!(config = %config.summary_short(), "starting demo");

    let counter = CommitCounter::new();
    let surface = match TerminalSurface::new(io::stdout(), counter.clone()) {
        Ok(surface) => surface,
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            process::exit(1);
        }
    };
    let scroller = AutoScroller::new(counter, &config, opts.scroll_interval());

    let mut program = Program::with_event_source(
        FeedApp::new(&config, surface),
        scroller,
        io::stdout(),
        ProgramConfig::default(),
    );
    if let Err(e) = program.run() {
        eprintln!("Runtime error: {e}");
        process::exit(1);
    }

    let app = program.model();
    info!(
        commits = app.commits(),
        failures = app.failures(),
        cursor = app.controller().cursor(),
        "demo finished"
    );
    if let Some(err) = app.last_error() {
        warn!(%err, "last commit error");
    }
}

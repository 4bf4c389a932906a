#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via `SCROLLFEED_DEMO_*` prefix.

use scrollfeed_core::FeedConfig;
use std::env;
use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
scrollfeed demo: an auto-scrolling list that loads two sections at a time

USAGE:
    scrollfeed-demo [OPTIONS]

OPTIONS:
    --sections=N         Sections in the dataset (default: 10)
    --page-size=N        Rows per section (default: 10)
    --latency-ms=N       Simulated load latency per append (default: 1000)
    --scroll-ms=N        Delay between displayed rows (default: 40)
    --animate            Ask the surface to animate appends
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    SCROLLFEED_DEMO_SECTIONS     Override --sections
    SCROLLFEED_DEMO_PAGE_SIZE    Override --page-size
    SCROLLFEED_DEMO_LATENCY_MS   Override --latency-ms
    SCROLLFEED_DEMO_SCROLL_MS    Override --scroll-ms
    SCROLLFEED_*                 Library defaults (see scrollfeed-core config)
    RUST_LOG                     Log filter for stderr output (default: warn)";

/// Default pause between displayed rows.
pub const DEFAULT_SCROLL_MS: u64 = 40;

/// Parsed command-line options. `None` fields fall back to the library
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub sections: Option<usize>,
    pub page_size: Option<usize>,
    pub latency_ms: Option<u64>,
    pub scroll_ms: u64,
    pub animate: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            sections: None,
            page_size: None,
            latency_ms: None,
            scroll_ms: DEFAULT_SCROLL_MS,
            animate: false,
        }
    }
}

/// What the binary should do after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse process arguments and environment variables.
    ///
    /// # Errors
    ///
    /// A message naming the offending argument.
    pub fn parse() -> Result<CliAction, String> {
        Self::parse_from(env::args().skip(1), |key| env::var(key).ok())
    }

    /// Parse `args` with `get_env` as the environment.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    ///
    /// # Errors
    ///
    /// A message naming the offending argument.
    pub fn parse_from<I, F>(args: I, mut get_env: F) -> Result<CliAction, String>
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Environment first; unparsable values are ignored.
        if let Some(n) = get_env("SCROLLFEED_DEMO_SECTIONS").and_then(|v| v.parse().ok()) {
            opts.sections = Some(n);
        }
        if let Some(n) = get_env("SCROLLFEED_DEMO_PAGE_SIZE")
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
        {
            opts.page_size = Some(n);
        }
        if let Some(n) = get_env("SCROLLFEED_DEMO_LATENCY_MS").and_then(|v| v.parse().ok()) {
            opts.latency_ms = Some(n);
        }
        if let Some(n) = get_env("SCROLLFEED_DEMO_SCROLL_MS").and_then(|v| v.parse().ok()) {
            opts.scroll_ms = n;
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(CliAction::Help),
                "--version" | "-V" => return Ok(CliAction::Version),
                "--animate" => opts.animate = true,
                other => {
                    if let Some(val) = other.strip_prefix("--sections=") {
                        opts.sections = Some(parse_value("--sections", val)?);
                    } else if let Some(val) = other.strip_prefix("--page-size=") {
                        let n = parse_value("--page-size", val)?;
                        if n == 0 {
                            return Err(format!("Invalid --page-size value: {val}"));
                        }
                        opts.page_size = Some(n);
                    } else if let Some(val) = other.strip_prefix("--latency-ms=") {
                        opts.latency_ms = Some(parse_value("--latency-ms", val)?);
                    } else if let Some(val) = other.strip_prefix("--scroll-ms=") {
                        opts.scroll_ms = parse_value("--scroll-ms", val)?;
                    } else {
                        return Err(format!(
                            "Unknown argument: {other}\nRun with --help for usage information."
                        ));
                    }
                }
            }
        }

        Ok(CliAction::Run(opts))
    }

    /// Overlay these options on `base`.
    #[must_use]
    pub fn apply_to(&self, mut base: FeedConfig) -> FeedConfig {
        if let Some(n) = self.sections {
            base.total_sections = n;
        }
        if let Some(n) = self.page_size {
            base.page_size = n;
        }
        if let Some(ms) = self.latency_ms {
            base.commit_latency = Duration::from_millis(ms);
        }
        if self.animate {
            base.animate = true;
        }
        base
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_ms)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid {flag} value: {val}"))
}

#![forbid(unsafe_code)]

//! Feed configuration.
//!
//! Defaults describe a small demo feed: 10 sections of 10 rows, a 1 second
//! simulated load latency, no animation.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |---|---|---|
//! | `SCROLLFEED_TOTAL_SECTIONS` | `total_sections` | integer |
//! | `SCROLLFEED_PAGE_SIZE` | `page_size` | integer >= 1 |
//! | `SCROLLFEED_LATENCY_MS` | `commit_latency` | milliseconds |
//! | `SCROLLFEED_ANIMATE` | `animate` | 1/0/true/false/yes/no/on/off |
//!
//! Invalid values are reported as [`ConfigError`]s and the default is kept. A
//! section/page shape larger than [`MAX_TOTAL_ITEMS`] falls back to the default
//! shape.

use std::env;
use std::fmt;
use std::time::Duration;

const ENV_TOTAL_SECTIONS: &str = "SCROLLFEED_TOTAL_SECTIONS";
const ENV_PAGE_SIZE: &str = "SCROLLFEED_PAGE_SIZE";
const ENV_LATENCY_MS: &str = "SCROLLFEED_LATENCY_MS";
const ENV_ANIMATE: &str = "SCROLLFEED_ANIMATE";

/// Default number of sections in the dataset.
pub const DEFAULT_TOTAL_SECTIONS: usize = 10;
/// Default rows per section.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Default simulated latency of one append.
pub const DEFAULT_COMMIT_LATENCY: Duration = Duration::from_secs(1);
/// Largest dataset (`total_sections * page_size` items) a config may describe.
pub const MAX_TOTAL_ITEMS: usize = 1 << 24;

/// Pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Sections in the dataset.
    pub total_sections: usize,
    /// Rows per section.
    pub page_size: usize,
    /// Delay between triggering an append and applying it.
    pub commit_latency: Duration,
    /// Whether appends are applied with animation. Off by default so prior
    /// rows never move.
    pub animate: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            total_sections: DEFAULT_TOTAL_SECTIONS,
            page_size: DEFAULT_PAGE_SIZE,
            commit_latency: DEFAULT_COMMIT_LATENCY,
            animate: false,
        }
    }
}

/// Result of parsing configuration from the environment.
#[derive(Debug, Clone)]
pub struct FeedConfigParse {
    pub config: FeedConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl FeedConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_sections(mut self, total_sections: usize) -> Self {
        self.total_sections = total_sections;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn commit_latency(mut self, latency: Duration) -> Self {
        self.commit_latency = latency;
        self
    }

    #[must_use]
    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> FeedConfig {
        let parsed = Self::from_env_with_diagnostics();
        #[cfg(feature = "tracing")]
        for error in &parsed.errors {
            tracing::warn!(%error, "ignoring invalid scrollfeed config value");
        }
        parsed.config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> FeedConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.page_size == 0 {
            errors.push(ConfigError::new("page_size", "0", "must be >= 1"));
        }
        if let Err(error) = self.check_capacity() {
            errors.push(error);
        }
        if self.total_sections % 2 != 0 {
            errors.push(ConfigError::new(
                "total_sections",
                self.total_sections.to_string(),
                "sections load in pairs; the trailing odd section is never appended",
            ));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Check that the dataset this config describes fits in
    /// [`MAX_TOTAL_ITEMS`].
    ///
    /// # Errors
    ///
    /// A `total_items` [`ConfigError`] when the product overflows or exceeds
    /// the cap.
    pub fn check_capacity(&self) -> Result<(), ConfigError> {
        match self.total_sections.checked_mul(self.page_size) {
            Some(items) if items <= MAX_TOTAL_ITEMS => Ok(()),
            product => Err(ConfigError::new(
                "total_items",
                product.map_or_else(
                    || format!("{}×{}", self.total_sections, self.page_size),
                    |items| items.to_string(),
                ),
                format!("must be <= {MAX_TOTAL_ITEMS}"),
            )),
        }
    }

    /// Short human-readable summary for log lines.
    #[must_use]
    pub fn summary_short(&self) -> String {
        format!(
            "{} sections × {} rows · latency {}ms · animate {}",
            self.total_sections,
            self.page_size,
            self.commit_latency.as_millis(),
            if self.animate { "on" } else { "off" }
        )
    }
}

/// Parse configuration from an arbitrary key lookup.
///
/// [`FeedConfig::from_env_with_diagnostics`] passes `std::env::var`; tests and
/// the demo CLI pass their own maps.
pub fn from_env_with<F>(mut get: F) -> FeedConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = FeedConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_TOTAL_SECTIONS) {
        match parse_usize(&value) {
            Some(parsed) => config.total_sections = parsed,
            None => errors.push(ConfigError::new(
                "total_sections",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Some(value) = get(ENV_PAGE_SIZE) {
        match parse_usize(&value) {
            Some(parsed) if parsed > 0 => config.page_size = parsed,
            _ => errors.push(ConfigError::new(
                "page_size",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_LATENCY_MS) {
        match value.trim().parse::<u64>() {
            Ok(ms) => config.commit_latency = Duration::from_millis(ms),
            Err(_) => errors.push(ConfigError::new(
                "commit_latency",
                value,
                "expected milliseconds",
            )),
        }
    }

    if let Some(value) = get(ENV_ANIMATE) {
        match parse_bool(&value) {
            Some(parsed) => config.animate = parsed,
            None => errors.push(ConfigError::new(
                "animate",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Err(error) = config.check_capacity() {
        errors.push(error);
        config.total_sections = DEFAULT_TOTAL_SECTIONS;
        config.page_size = DEFAULT_PAGE_SIZE;
    }

    FeedConfigParse { config, errors }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

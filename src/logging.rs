//! Tracing infrastructure.
//!
//! Structured logging for the driver and the CLI client, built on `tracing`
//! and `tracing-subscriber`:
//! - environment-based filtering (`RUST_LOG` wins over the configured level),
//! - compact or pretty output,
//! - level taken from the configuration system.
//!
//! The driver logs every lifecycle transition and endpoint operation; with
//! the default `info` level that mirrors the open/close/init/teardown
//! coverage of a chatty character driver, while `debug` adds per-read and
//! per-write events.

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::Settings;

/// Output format for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed format with colors (for development).
    Pretty,
    /// Compact format without colors (for scripts and tests).
    Compact,
}

/// Tracing configuration options.
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Log level used when `RUST_LOG` is not set.
    pub level: Level,
    /// Output format.
    pub format: OutputFormat,
    /// Whether to enable ANSI colors.
    pub with_ansi: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_ansi: true,
        }
    }
}

impl TracingOptions {
    /// Create options from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&settings.application.log_level)?,
            ..Self::default()
        })
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Parse a log level string.
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(format!(
            "invalid log level '{other}': must be trace, debug, info, warn, or error"
        )),
    }
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber is already installed; callers that do
/// not care (tests, repeated CLI invocations in-process) can ignore it.
pub fn init(options: &TracingOptions) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.level.to_string()));

    let fmt_layer = match options.format {
        OutputFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(options.with_ansi)
            .boxed(),
        OutputFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_ansi(options.with_ansi)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| format!("failed to install tracing subscriber: {err}"))
}

/// Install the global subscriber from loaded settings.
pub fn init_from_settings(settings: &Settings) -> Result<(), String> {
    init(&TracingOptions::from_settings(settings)?)
}

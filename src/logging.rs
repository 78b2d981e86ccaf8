// src/logging.rs

//! Logging setup for `conveyor` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CONVEYOR_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout stays free for component output.
//!
//! Every component gets a [`ComponentLogger`] injected by the host via
//! `set_logger`. It carries the component name and prefixes each message with
//! a per-level emoji from a plain data table.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Per-level message prefixes. Kept as pure data so formatting stays
/// separate from behaviour.
const EMOJI_TABLE: [(&str, &str); 4] = [
    ("debug", "\u{1F50D}"), // magnifying glass
    ("info", "\u{2139}\u{FE0F}"),
    ("warn", "\u{26A0}\u{FE0F}"),
    ("error", "\u{274C}"),
];

fn emoji_for(level: &str) -> &'static str {
    EMOJI_TABLE
        .iter()
        .find(|(name, _)| *name == level)
        .map(|(_, e)| *e)
        .unwrap_or("")
}

/// Leveled logger handed to each component by the host.
///
/// This is a thin facade over the `tracing` macros; the component name is
/// attached as a structured field so log output can be filtered per plugin.
#[derive(Debug, Clone)]
pub struct ComponentLogger {
    component: String,
}

impl ComponentLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Anonymous logger used before a component has been registered.
    pub fn unbound() -> Self {
        Self::new("<unbound>")
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!(component = %self.component, "{} {msg}", emoji_for("debug"));
    }

    pub fn info(&self, msg: &str) {
        tracing::info!(component = %self.component, "{} {msg}", emoji_for("info"));
    }

    pub fn warn(&self, msg: &str) {
        tracing::warn!(component = %self.component, "{} {msg}", emoji_for("warn"));
    }

    pub fn error(&self, msg: &str) {
        tracing::error!(component = %self.component, "{} {msg}", emoji_for("error"));
    }
}

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("CONVEYOR_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    // Send logs to stderr; keep stdout free for component output.
    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

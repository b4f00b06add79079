//! # Structured Logging Module
//!
//! Two concerns live here:
//!
//! - Process-level `tracing` setup, environment aware, for the engine's own
//!   operational diagnostics.
//! - The [`LogSink`] collaborator that receives the human-readable test output
//!   (bank notices, assertion results, summaries) with a [`Severity`] external
//!   tooling can filter on.

use crate::config::TestbedConfig;
use crate::constants;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Whether the installed layer emits JSON; unset until logging is initialized
static LOGGER_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Initialize console logging with environment-specific level selection
pub fn init_structured_logging() {
    init_structured_logging_with(false);
}

/// Initialize logging in the format selected by `json_logs`
pub fn init_structured_logging_from(config: &TestbedConfig) {
    init_structured_logging_with(config.json_logs);
}

/// Initialize logging, optionally emitting JSON lines instead of plain text.
///
/// Only the first call installs a layer; later calls keep its format.
pub fn init_structured_logging_with(json: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if json {
            fmt_layer::layer()
                .with_target(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt_layer::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Hosts frequently install their own subscriber first
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(environment = %environment, json = json, "Structured logging initialized");
        json
    });
}

/// Format chosen by the first initialization, `None` before any
pub fn json_logging_enabled() -> Option<bool> {
    LOGGER_INITIALIZED.get().copied()
}

fn get_environment() -> String {
    std::env::var(constants::env::ENVIRONMENT).unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Severity attached to every message handed to a [`LogSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Destination for human-readable test output.
///
/// Formatting of `message` is presentation detail; `severity` is contractual.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str, severity: Severity, error: Option<&anyhow::Error>);
}

/// Forwards sink output to `tracing` at the matching level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str, severity: Severity, error: Option<&anyhow::Error>) {
        let error = error.map(|e| format!("{e:#}"));
        match severity {
            Severity::Info => tracing::info!(target: "testbed", error = ?error, "{message}"),
            Severity::Warning => tracing::warn!(target: "testbed", error = ?error, "{message}"),
            Severity::Error => tracing::error!(target: "testbed", error = ?error, "{message}"),
        }
    }
}

/// One message captured by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub error: Option<String>,
}

/// In-memory sink, useful for hosts that render results themselves
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.severity == severity)
            .count()
    }

    /// Messages containing `needle`, in emission order
    pub fn matching(&self, needle: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.message.contains(needle))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for RecordingSink {
    fn log(&self, message: &str, severity: Severity, error: Option<&anyhow::Error>) {
        self.entries.lock().push(LogEntry {
            message: message.to_string(),
            severity,
            error: error.map(|e| format!("{e:#}")),
        });
    }
}

//! Page console.
//!
//! Centralizes output from page behaviours and uncaught error reporting.
//! Every entry is kept for inspection and forwarded to the `log` crate under
//! the `console` target.

use log::{error, info, warn};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Info,
    Warn,
    Error,
}

/// One console line with the virtual time it was written at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsoleEntry {
    pub level: LogLevel,
    pub message: String,
    pub time_ms: u64,
}

/// Console keeps every message the page wrote, in order.
#[derive(Default, Debug)]
pub struct Console {
    entries: Vec<ConsoleEntry>,
}

impl Console {
    #[inline]
    pub fn write(&mut self, level: LogLevel, message: String, time_ms: u64) {
        match level {
            LogLevel::Log | LogLevel::Info => info!(target: "console", "[{time_ms}ms] {message}"),
            LogLevel::Warn => warn!(target: "console", "[{time_ms}ms] {message}"),
            LogLevel::Error => error!(target: "console", "[{time_ms}ms] {message}"),
        }
        self.entries.push(ConsoleEntry {
            level,
            message,
            time_ms,
        });
    }

    #[inline]
    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    /// Messages written at `level`, oldest first.
    pub fn messages(&self, level: LogLevel) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.as_str())
            .collect()
    }
}

//! Progress log: one timestamped line per pipeline stage.
//!
//! Sinks never fail the caller. The file sink opens the log in append mode for
//! each entry and writes the full line with a single `write_all`, so several
//! processes sharing a log interleave whole lines.

use chrono::{Local, NaiveDateTime};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// `2026-Oct-16-09:15:02`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

/// Receiver for pipeline progress messages.
pub trait ProgressSink {
    /// Record a message. Must not panic or propagate errors.
    fn log(&self, message: &str);
}

/// Format one log line, newline included.
pub fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("{} : {message}\n", at.format(TIMESTAMP_FORMAT))
}

/// Appends lines to a file on disk.
#[derive(Debug, Clone)]
pub struct FileProgressLog {
    path: PathBuf,
}

impl FileProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl ProgressSink for FileProgressLog {
    fn log(&self, message: &str) {
        let line = format_line(Local::now().naive_local(), message);
        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append progress log");
        }
    }
}

/// Keeps messages in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryProgressLog {
    messages: Mutex<Vec<String>>,
}

impl MemoryProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for MemoryProgressLog {
    fn log(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut m) => m.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

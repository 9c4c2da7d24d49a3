//! Log record representation handed to formatters and handlers.
//!
//! A `LogRecord` is built on the thread that emitted the log call so that
//! thread-bound details (thread name, rendered thread-local context) are
//! captured before the record crosses into a handler's worker thread.

use crate::level::LogLevel;
use std::fmt;
use std::thread::{self, ThreadId};
use std::time::SystemTime;

/// Source location and runtime details of a log call.
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file path for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the record.
    pub thread_id: ThreadId,
    /// Name of the thread that created the record (if any).
    pub thread_name: Option<String>,
}

impl RecordMetadata {
    /// Capture timestamp and thread info from the current execution context.
    fn capture_runtime() -> (SystemTime, ThreadId, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current.id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            timestamp,
            thread_id,
            thread_name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Name of the logger (the `log` target) that created this record.
    pub logger: String,
    pub level: LogLevel,
    pub message: String,
    /// Rendered `[[key=value,...]]` context, empty when none was active.
    pub context: String,
    pub metadata: RecordMetadata,
}

impl LogRecord {
    /// Construct a new log record from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: LogLevel, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            context: String::new(),
            metadata: RecordMetadata::default(),
        }
    }

    /// Construct a log record with explicit source location.
    pub fn with_metadata(
        logger: &str,
        level: LogLevel,
        message: &str,
        mut metadata: RecordMetadata,
    ) -> Self {
        let (timestamp, thread_id, thread_name) = RecordMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            context: String::new(),
            metadata,
        }
    }

    /// Attach an already rendered context string.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Build a record from a `log` crate record.
    pub(crate) fn from_log(record: &log::Record<'_>, context: String) -> Self {
        let metadata = RecordMetadata {
            module_path: record.module_path().unwrap_or_default().to_string(),
            filename: record.file().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            ..Default::default()
        };
        Self::with_metadata(
            record.target(),
            LogLevel::from(record.level()),
            &record.args().to_string(),
            metadata,
        )
        .with_context(context)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}

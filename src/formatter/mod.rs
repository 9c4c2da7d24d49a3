//! Formatter implementations.
//!
//! Provides the core [`LogFormatter`] trait, a shared trait-object wrapper
//! and the [`PercentFormatter`] that renders `%(token)s` style format
//! strings, including the `%(context)s` and `%(timezone)s` placeholders
//! driven by the active [`LogSpec`](crate::LogSpec) and
//! [`LogContext`](crate::LogContext).

use std::{fmt, sync::Arc};

use crate::log_record::LogRecord;

mod percent;

pub use percent::{PercentFormatter, is_using_format};

/// Trait for formatting log records into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// moved onto handler worker threads.
pub trait LogFormatter: Send + Sync {
    /// Format a log record into a string representation.
    fn format(&self, record: &LogRecord) -> String;
}

/// Shared formatter trait object used across handlers.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn LogFormatter + Send + Sync>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: LogFormatter + Send + Sync + 'static,
    {
        let inner: Arc<dyn LogFormatter + Send + Sync> = Arc::new(formatter);
        Self { inner }
    }

    /// Format a log record using the wrapped formatter instance.
    pub fn format(&self, record: &LogRecord) -> String {
        self.inner.format(record)
    }
}

impl LogFormatter for SharedFormatter {
    fn format(&self, record: &LogRecord) -> String {
        self.inner.format(record)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn LogFormatter>)")
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DefaultFormatter;

impl LogFormatter for DefaultFormatter {
    fn format(&self, record: &LogRecord) -> String {
        format!(
            "{} [{}] {}{}",
            record.logger,
            record.level,
            context_prefix(&record.context),
            record.message
        )
    }
}

/// Rendered context followed by a separating space, or nothing.
pub(crate) fn context_prefix(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("{context} ")
    }
}

#[cfg(test)]
mod tests {
    //! Tests for formatter implementations.

    use super::*;
    use crate::level::LogLevel;
    use static_assertions::assert_impl_all;

    #[test]
    fn shared_formatter_is_send_sync() {
        assert_impl_all!(SharedFormatter: Send, Sync);
        assert_impl_all!(PercentFormatter: Send, Sync);
    }

    #[test]
    fn default_formatter_formats_basic_record() {
        let record = LogRecord::new("test", LogLevel::Info, "hello");
        assert_eq!(DefaultFormatter.format(&record), "test [INFO] hello");
    }

    #[test]
    fn default_formatter_includes_context() {
        let record =
            LogRecord::new("test", LogLevel::Warn, "careful").with_context("[[worker=joe]]");
        assert_eq!(
            DefaultFormatter.format(&record),
            "test [WARN] [[worker=joe]] careful"
        );
    }

    #[test]
    fn shared_formatter_delegates() {
        let shared = SharedFormatter::new(PercentFormatter::new("%(levelname)s %(message)s"));
        let record = LogRecord::new("test", LogLevel::Error, "boom");
        assert_eq!(shared.clone().format(&record), "ERROR boom");
    }
}

use std::any::Any;

use thiserror::Error;

use crate::log_record::LogRecord;

/// Errors a handler reports when it cannot accept a record.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandlerError {
    /// The worker queue is full; the record was dropped.
    #[error("handler queue is full")]
    QueueFull,
    /// The handler has been closed.
    #[error("handler is closed")]
    Closed,
}

/// Trait implemented by all log handlers.
///
/// Handlers are shared between the root handler list and the isolation
/// snapshots, so they must be `Send + Sync`. Implementations forward records
/// to their own consumer thread without blocking the caller.
pub trait LogHandler: Send + Sync {
    /// Dispatch a log record for handling.
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError>;

    /// Block until queued records have been written. Returns `false` when the
    /// flush could not be confirmed.
    fn flush(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}

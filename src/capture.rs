//! Handler that captures formatted lines for later inspection.
//!
//! A [`CaptureHandler`] stays silent while its manager has an isolation
//! scope open, so logging done by code under an isolated setup does not
//! leak into an outer capture.

use std::any::Any;
use std::io::Write;

use crate::formatter::{LogFormatter, SharedFormatter};
use crate::handler::{HandlerError, LogHandler};
use crate::handlers::SharedBuffer;
use crate::log_record::LogRecord;
use crate::manager::{self, LogManager};

pub struct CaptureHandler {
    manager: &'static LogManager,
    formatter: SharedFormatter,
    buffer: SharedBuffer,
}

impl CaptureHandler {
    /// Capture into `buffer`, suppressed while `manager` is isolated.
    pub fn new<F>(manager: &'static LogManager, formatter: F, buffer: SharedBuffer) -> Self
    where
        F: LogFormatter + 'static,
    {
        Self {
            manager,
            formatter: SharedFormatter::new(formatter),
            buffer,
        }
    }

    /// Capture for the process-wide manager.
    pub fn for_global<F>(formatter: F, buffer: SharedBuffer) -> Self
    where
        F: LogFormatter + 'static,
    {
        Self::new(manager::global(), formatter, buffer)
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}

impl LogHandler for CaptureHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        if self.manager.isolation_depth() > 0 {
            return Ok(());
        }
        let mut line = self.formatter.format(&record);
        line.push('\n');
        let mut buffer = self.buffer.clone();
        buffer
            .write_all(line.as_bytes())
            .map_err(|_| HandlerError::Closed)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

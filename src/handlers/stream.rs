//! Console handler writing to stdout, stderr or an in-memory buffer.

use std::{
    any::Any,
    fmt,
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

use super::worker::{DEFAULT_CHANNEL_CAPACITY, Worker};
use crate::{
    formatter::LogFormatter,
    handler::{HandlerError, LogHandler},
    level::LogLevel,
    log_record::LogRecord,
};

/// Thread-safe byte buffer that console output can be pointed at.
///
/// Clones share the same storage, so a test can keep one clone while the
/// handler's worker thread writes through another.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Return the current contents and clear the buffer.
    pub fn pop(&self) -> String {
        let mut guard = self.inner.lock();
        let text = String::from_utf8_lossy(&guard).into_owned();
        guard.clear();
        text
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Whether both handles point at the same storage.
    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedBuffer({} bytes)", self.inner.lock().len())
    }
}

/// Destination of console logging.
#[derive(Clone, Debug, Default)]
pub enum ConsoleStream {
    Stdout,
    #[default]
    Stderr,
    Buffer(SharedBuffer),
}

impl PartialEq for ConsoleStream {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Stdout, Self::Stdout) | (Self::Stderr, Self::Stderr) => true,
            (Self::Buffer(a), Self::Buffer(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl ConsoleStream {
    /// Parse `"stdout"` / `"stderr"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stdout" => Some(Self::Stdout),
            "stderr" => Some(Self::Stderr),
            _ => None,
        }
    }

    fn writer(&self) -> ConsoleWriter {
        match self {
            Self::Stdout => ConsoleWriter::Stdout(io::stdout()),
            Self::Stderr => ConsoleWriter::Stderr(io::stderr()),
            Self::Buffer(buffer) => ConsoleWriter::Buffer(buffer.clone()),
        }
    }
}

enum ConsoleWriter {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
    Buffer(SharedBuffer),
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(out) => out.write(buf),
            Self::Stderr(err) => err.write(buf),
            Self::Buffer(buffer) => buffer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(out) => out.flush(),
            Self::Stderr(err) => err.flush(),
            Self::Buffer(buffer) => buffer.flush(),
        }
    }
}

/// Handler that writes formatted records to a [`ConsoleStream`].
///
/// Records below `level` are ignored. Writing happens on a background
/// thread; call [`LogHandler::flush`] before inspecting a buffer stream.
pub struct StreamHandler {
    worker: Worker,
    level: LogLevel,
}

impl StreamHandler {
    pub fn new<F>(stream: &ConsoleStream, formatter: F, level: LogLevel) -> Self
    where
        F: LogFormatter + 'static,
    {
        Self::with_capacity(stream, formatter, level, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity<F>(
        stream: &ConsoleStream,
        formatter: F,
        level: LogLevel,
        capacity: usize,
    ) -> Self
    where
        F: LogFormatter + 'static,
    {
        Self {
            worker: Worker::spawn("StreamHandler", stream.writer(), formatter, capacity),
            level,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl LogHandler for StreamHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        if !self.level.admits(record.level) {
            return Ok(());
        }
        self.worker.send(record)
    }

    fn flush(&self) -> bool {
        self.worker.flush()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::{DefaultFormatter, PercentFormatter};
    use rstest::rstest;

    #[rstest]
    fn writes_records_at_or_above_level() {
        let buffer = SharedBuffer::new();
        let handler = StreamHandler::new(
            &ConsoleStream::Buffer(buffer.clone()),
            PercentFormatter::new("%(levelname)s %(message)s"),
            LogLevel::Info,
        );
        handler
            .handle(LogRecord::new("core", LogLevel::Debug, "hidden"))
            .expect("debug is filtered silently");
        handler
            .handle(LogRecord::new("core", LogLevel::Info, "shown"))
            .expect("info is queued");
        assert!(handler.flush());
        assert_eq!(buffer.pop(), "INFO shown\n");
        assert!(buffer.is_empty());
    }

    #[rstest]
    fn buffer_streams_compare_by_identity() {
        let a = SharedBuffer::new();
        let b = SharedBuffer::new();
        assert_eq!(ConsoleStream::Buffer(a.clone()), ConsoleStream::Buffer(a));
        assert_ne!(ConsoleStream::Buffer(b), ConsoleStream::Stderr);
        assert_eq!(ConsoleStream::from_name("STDOUT"), Some(ConsoleStream::Stdout));
        assert_eq!(ConsoleStream::from_name("pipe"), None);
    }

    #[rstest]
    fn drop_drains_queue() {
        let buffer = SharedBuffer::new();
        let handler = StreamHandler::new(
            &ConsoleStream::Buffer(buffer.clone()),
            DefaultFormatter,
            LogLevel::Trace,
        );
        for i in 0..5 {
            handler
                .handle(LogRecord::new("core", LogLevel::Info, &format!("msg{i}")))
                .expect("queue has room");
        }
        drop(handler);
        assert_eq!(buffer.contents().lines().count(), 5);
    }
}

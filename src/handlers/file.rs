//! File handler appending formatted records to a log file.
//!
//! The file is opened (and created if needed) on construction; the worker
//! thread owns the handle and flushes after every record.

use std::{
    any::Any,
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use super::worker::{DEFAULT_CHANNEL_CAPACITY, Worker};
use crate::{
    formatter::LogFormatter,
    handler::{HandlerError, LogHandler},
    level::LogLevel,
    log_record::LogRecord,
};

pub struct FileHandler {
    worker: Worker,
    level: LogLevel,
    path: PathBuf,
}

impl FileHandler {
    /// Open `path` for appending.
    pub fn open<P, F>(path: P, formatter: F, level: LogLevel) -> io::Result<Self>
    where
        P: AsRef<Path>,
        F: LogFormatter + 'static,
    {
        Self::with_capacity(path, formatter, level, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity<P, F>(
        path: P,
        formatter: F,
        level: LogLevel,
        capacity: usize,
    ) -> io::Result<Self>
    where
        P: AsRef<Path>,
        F: LogFormatter + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            worker: Worker::spawn("FileHandler", file, formatter, capacity),
            level,
            path,
        })
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogHandler for FileHandler {
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
    use crate::formatter::DefaultFormatter;
    use rstest::rstest;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[rstest]
    fn appends_to_file() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").expect("seed log file");
        let handler =
            FileHandler::open(&path, DefaultFormatter, LogLevel::Debug).expect("open log file");
        handler
            .handle(LogRecord::new("core", LogLevel::Info, "hello"))
            .expect("queue accepts record");
        drop(handler);
        assert_eq!(
            fs::read_to_string(&path).expect("read log"),
            "existing\ncore [INFO] hello\n"
        );
    }

    #[rstest]
    fn concurrent_usage() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("app.log");
        let handler = Arc::new(
            FileHandler::open(&path, DefaultFormatter, LogLevel::Debug).expect("open log file"),
        );
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let h = Arc::clone(&handler);
                thread::spawn(move || {
                    h.handle(LogRecord::new("core", LogLevel::Info, &format!("msg{i}")))
                        .expect("queue has room");
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join writer thread");
        }
        assert!(handler.flush());
        let output = fs::read_to_string(handler.path()).expect("read log");
        for i in 0..10 {
            assert!(output.contains(&format!("core [INFO] msg{i}")));
        }
    }

    #[rstest]
    fn open_fails_for_missing_parent() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("missing").join("app.log");
        assert!(FileHandler::open(&path, DefaultFormatter, LogLevel::Debug).is_err());
    }
}

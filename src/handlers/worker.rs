//! Background writer thread shared by the stream and file handlers.
//!
//! The worker owns the writer and formatter. Records arrive over a bounded
//! channel; a `Flush` command flushes the writer and acknowledges on a
//! second channel so callers can wait for queued output to land.

use std::{
    io::Write,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::warn;

use crate::{
    formatter::LogFormatter, handler::HandlerError, log_record::LogRecord,
    rate_limited_warner::RateLimitedWarner,
};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Commands sent to the worker thread.
pub(crate) enum Command {
    Record(Box<LogRecord>),
    Flush,
}

pub(crate) struct Worker {
    name: &'static str,
    tx: Option<Sender<Command>>,
    ack_rx: Receiver<()>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    warner: RateLimitedWarner,
}

impl Worker {
    pub(crate) fn spawn<W, F>(name: &'static str, writer: W, formatter: F, capacity: usize) -> Self
    where
        W: Write + Send + 'static,
        F: LogFormatter + 'static,
    {
        let (tx, rx) = bounded::<Command>(capacity.max(1));
        let (ack_tx, ack_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        let handle = thread::spawn(move || {
            let mut writer = writer;
            for cmd in rx {
                match cmd {
                    Command::Record(record) => {
                        let msg = formatter.format(&record);
                        if let Err(e) = writeln!(writer, "{msg}").and_then(|_| writer.flush()) {
                            warn!("{name} write error: {e}");
                        }
                    }
                    Command::Flush => {
                        if writer.flush().is_err() {
                            warn!("{name} flush error");
                        }
                        let _ = ack_tx.send(());
                    }
                }
            }
            let _ = writer.flush();
            let _ = done_tx.send(());
        });
        Self {
            name,
            tx: Some(tx),
            ack_rx,
            done_rx,
            handle: Some(handle),
            warner: RateLimitedWarner::default(),
        }
    }

    /// Queue a record without blocking; full queues drop the record.
    pub(crate) fn send(&self, record: LogRecord) -> Result<(), HandlerError> {
        let Some(tx) = &self.tx else {
            return Err(HandlerError::Closed);
        };
        match tx.try_send(Command::Record(Box::new(record))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.warner.record_drop();
                let name = self.name;
                self.warner
                    .warn_if_due(|count| warn!("{name}: queue full, dropped {count} record(s)"));
                Err(HandlerError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(HandlerError::Closed),
        }
    }

    pub(crate) fn flush(&self) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(Command::Flush).is_err() {
            return false;
        }
        self.ack_rx.recv_timeout(FLUSH_TIMEOUT).is_ok()
    }

    pub(crate) fn close(&mut self) {
        self.tx.take();
        let name = self.name;
        self.warner
            .flush(|count| warn!("{name}: dropped {count} record(s) before close"));
        if let Some(handle) = self.handle.take() {
            if self.done_rx.recv_timeout(FLUSH_TIMEOUT).is_err() {
                warn!("{name}: worker thread did not shut down within 1s");
                return;
            }
            if handle.join().is_err() {
                warn!("{name}: worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.close();
    }
}

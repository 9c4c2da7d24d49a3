//! Concrete handlers installed by [`LogManager::setup`](crate::LogManager::setup).
//!
//! Both handlers share one background worker design: formatting and I/O
//! happen off the calling thread, and `flush()` waits for an
//! acknowledgement from the worker.

mod file;
mod stream;
mod worker;

pub use file::FileHandler;
pub use stream::{ConsoleStream, SharedBuffer, StreamHandler};
pub use worker::DEFAULT_CHANNEL_CAPACITY;

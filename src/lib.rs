//! Restorable, layered logging setup.
//!
//! - [`LogSpec`] describes where and how to log; [`LogSpec::usable_location`]
//!   resolves the log file.
//! - [`LogContext`] holds global and per-thread key/value pairs rendered into
//!   every line as `[[k=v,...]]`.
//! - [`LogManager`] installs handlers from a spec and undoes it with
//!   [`LogManager::reset`]; the `log` crate is bridged into [`global`].
//! - [`IsolatedLogSetup`] snapshots logging state for the length of a scope.

mod capture;
mod context;
mod formatter;
mod handler;
mod handlers;
mod isolation;
mod level;
pub mod log_compat;
mod log_record;
mod manager;
mod rate_limited_warner;
mod spec;
pub mod spec_file;
mod temp_folder;
pub mod template;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

#[cfg(test)]
mod test_utils;

pub use capture::CaptureHandler;
pub use context::{ContextError, LogContext};
pub use formatter::{
    DefaultFormatter, LogFormatter, PercentFormatter, SharedFormatter, is_using_format,
};
pub use handler::{HandlerError, LogHandler};
pub use handlers::{
    ConsoleStream, DEFAULT_CHANNEL_CAPACITY, FileHandler, SharedBuffer, StreamHandler,
};
pub use isolation::{ISOLATED_CONSOLE_FORMAT, IsolatedLogSetup, IsolationGuard};
pub use level::{LogLevel, ParseLevelError};
pub use log_record::{LogRecord, RecordMetadata};
pub use manager::{
    DEFAULT_GREETING, DEFAULT_ROOT_LEVEL, LogManager, SetupError, SetupOptions, global,
};
pub use spec::{
    DEFAULT_BASENAME, DEFAULT_CONSOLE_FORMAT, DEFAULT_FILE_FORMAT, DEFAULT_LOCATIONS, LogSpec,
    SpecError, SpecField, SpecSource, SpecValue, program_basename,
};
pub use spec_file::SpecFileError;
pub use temp_folder::TempFolder;

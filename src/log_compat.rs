//! Bridge from the `log` crate into the global [`LogManager`].
//!
//! [`install`] registers [`LogSetupAdapter`] as the process-wide `log`
//! logger. Every `log` macro call is then filtered by the manager's root
//! level and silenced targets, stamped with the caller's rendered context,
//! and dispatched to the root handlers.
//!
//! [`LogManager`]: crate::LogManager

use std::sync::OnceLock;

use log::{Metadata, Record};

use crate::level::LogLevel;
use crate::log_record::LogRecord;
use crate::manager;

/// Adapter implementing the `log::Log` trait on top of [`manager::global`].
pub struct LogSetupAdapter;

impl log::Log for LogSetupAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        manager::global().is_enabled(metadata.target(), LogLevel::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        let manager = manager::global();
        if !manager.is_enabled(record.target(), LogLevel::from(record.level())) {
            return;
        }
        manager.log(LogRecord::from_log(record, manager.context().rendered()));
    }

    fn flush(&self) {
        manager::global().flush();
    }
}

static ADAPTER: LogSetupAdapter = LogSetupAdapter;
static INSTALL_RESULT: OnceLock<bool> = OnceLock::new();

/// Install the adapter as the global `log` logger.
///
/// Returns `true` on success, `false` when another logger was installed
/// first. Subsequent calls return the cached outcome.
pub fn install() -> bool {
    *INSTALL_RESULT.get_or_init(|| {
        if log::set_logger(&ADAPTER).is_err() {
            return false;
        }
        log::set_max_level(log::LevelFilter::Trace);
        true
    })
}

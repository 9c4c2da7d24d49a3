//! Scoped save/restore of logging state.
//!
//! [`IsolatedLogSetup::enter`] snapshots the root handlers (and optionally
//! the spec's temp folder) of a [`LogManager`] and returns an
//! [`IsolationGuard`]. Dropping the guard, including during unwinding,
//! resets the manager and puts the snapshot back. Scopes nest; each guard
//! restores its own snapshot.
//!
//! ```no_run
//! use logsetup::{IsolatedLogSetup, SetupOptions, global};
//!
//! let guard = IsolatedLogSetup::new().enter().expect("temp folder");
//! global().setup(SetupOptions::new()).expect("setup");
//! // ... logging now goes to a file under guard.tmp()
//! drop(guard);
//! assert!(!global().is_set_up());
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::formatter::PercentFormatter;
use crate::handler::LogHandler;
use crate::handlers::{ConsoleStream, StreamHandler};
use crate::level::LogLevel;
use crate::manager::{self, LogManager};
use crate::temp_folder::TempFolder;

/// Format of the stderr handler installed when the temp folder is kept.
pub const ISOLATED_CONSOLE_FORMAT: &str = "%(levelname)s %(message)s";

/// Builder for an isolation scope.
#[derive(Clone, Copy, Debug)]
pub struct IsolatedLogSetup {
    adjust_tmp: bool,
}

impl Default for IsolatedLogSetup {
    fn default() -> Self {
        Self { adjust_tmp: true }
    }
}

impl IsolatedLogSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true` (the default) the spec's `tmp` points at a fresh temp
    /// folder for the scope and no handler is installed. When `false`, `tmp`
    /// is left alone and a DEBUG stderr handler is installed instead.
    pub fn adjust_tmp(mut self, adjust_tmp: bool) -> Self {
        self.adjust_tmp = adjust_tmp;
        self
    }

    /// Enter a scope on the process-wide manager.
    pub fn enter(self) -> io::Result<IsolationGuard<'static>> {
        self.enter_with(manager::global())
    }

    /// Enter a scope on `manager`.
    pub fn enter_with(self, manager: &LogManager) -> io::Result<IsolationGuard<'_>> {
        // Allocate first so a failure leaves the manager untouched.
        let temp_folder = if self.adjust_tmp {
            Some(TempFolder::new()?)
        } else {
            None
        };

        manager.enter_isolation();
        let saved_handlers = manager.set_root_handlers(Vec::new());
        let saved_tmp = match &temp_folder {
            Some(folder) => Some(manager.update_spec(|spec| {
                std::mem::replace(&mut spec.tmp, folder.path_string())
            })),
            None => {
                let formatter = PercentFormatter::new(ISOLATED_CONSOLE_FORMAT);
                let handler: Arc<dyn LogHandler> = Arc::new(StreamHandler::new(
                    &ConsoleStream::Stderr,
                    formatter,
                    LogLevel::Debug,
                ));
                manager.add_handler(handler);
                None
            }
        };

        Ok(IsolationGuard {
            manager,
            saved_handlers: Some(saved_handlers),
            saved_tmp,
            temp_folder,
        })
    }
}

/// Restores the state captured by [`IsolatedLogSetup`] when dropped.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct IsolationGuard<'a> {
    manager: &'a LogManager,
    saved_handlers: Option<Vec<Arc<dyn LogHandler>>>,
    saved_tmp: Option<String>,
    temp_folder: Option<TempFolder>,
}

impl IsolationGuard<'_> {
    /// Temp folder the spec points at during this scope, if any.
    pub fn tmp(&self) -> Option<&Path> {
        self.temp_folder.as_ref().map(TempFolder::path)
    }

    pub fn manager(&self) -> &LogManager {
        self.manager
    }
}

impl Drop for IsolationGuard<'_> {
    fn drop(&mut self) {
        self.manager.exit_isolation();
        self.manager.reset();
        self.temp_folder.take();
        if let Some(handlers) = self.saved_handlers.take() {
            self.manager.set_root_handlers(handlers);
        }
        if let Some(tmp) = self.saved_tmp.take() {
            self.manager.update_spec(|spec| spec.tmp = tmp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::SharedBuffer;
    use crate::manager::SetupOptions;
    use crate::spec::{LogSpec, SpecValue};
    use crate::test_utils::collecting_handler::CollectingHandler;
    use rstest::{fixture, rstest};
    use std::panic::{self, AssertUnwindSafe};

    #[fixture]
    fn manager() -> LogManager {
        let mut spec = LogSpec::default();
        spec.set_overrides([
            ("appname", SpecValue::from("testing")),
            ("tmp", SpecValue::from("/original/tmp")),
            ("locations", SpecValue::from(vec!["{tmp}/{basename}"])),
            ("console_stream", SpecValue::from(ConsoleStream::Buffer(SharedBuffer::new()))),
        ])
        .expect("valid overrides");
        let manager = LogManager::new(spec);
        manager.add_handler(Arc::new(CollectingHandler::new()));
        manager
    }

    #[rstest]
    fn adjusts_tmp_and_restores(manager: LogManager) {
        let before = manager.root_handlers();
        {
            let guard = IsolatedLogSetup::new().enter_with(&manager).expect("enter");
            let tmp = guard.tmp().expect("temp folder allocated").to_path_buf();
            assert_eq!(manager.isolation_depth(), 1);
            assert!(manager.root_handlers().is_empty());
            assert_eq!(manager.spec().tmp, tmp.display().to_string());

            manager.setup(SetupOptions::new().without_greeting()).expect("setup");
            assert_eq!(manager.file_location(), Some(tmp.join("testing.log")));
        }
        assert_eq!(manager.isolation_depth(), 0);
        assert!(!manager.is_set_up());
        assert_eq!(manager.spec().tmp, "/original/tmp");
        let after = manager.root_handlers();
        assert_eq!(after.len(), before.len());
        assert!(Arc::ptr_eq(&after[0], &before[0]));
    }

    #[rstest]
    fn temp_folder_removed_on_exit(manager: LogManager) {
        let guard = IsolatedLogSetup::new().enter_with(&manager).expect("enter");
        let tmp = guard.tmp().expect("temp folder allocated").to_path_buf();
        assert!(tmp.is_dir());
        drop(guard);
        assert!(!tmp.exists());
    }

    #[rstest]
    fn keeping_tmp_installs_stderr_handler(manager: LogManager) {
        let guard = IsolatedLogSetup::new()
            .adjust_tmp(false)
            .enter_with(&manager)
            .expect("enter");
        assert!(guard.tmp().is_none());
        assert_eq!(manager.spec().tmp, "/original/tmp");
        let handlers = manager.root_handlers();
        assert_eq!(handlers.len(), 1);
        let stream = handlers[0]
            .as_any()
            .downcast_ref::<StreamHandler>()
            .expect("stderr stream handler");
        assert_eq!(stream.level(), LogLevel::Debug);
        drop(guard);
        assert_eq!(manager.root_handlers().len(), 1);
        assert!(manager.root_handlers()[0]
            .as_any()
            .downcast_ref::<CollectingHandler>()
            .is_some());
    }

    #[rstest]
    fn nested_scopes_restore_their_own_snapshot(manager: LogManager) {
        let outer = IsolatedLogSetup::new().enter_with(&manager).expect("enter outer");
        let outer_tmp = manager.spec().tmp;
        {
            let inner = IsolatedLogSetup::new().enter_with(&manager).expect("enter inner");
            assert_eq!(manager.isolation_depth(), 2);
            assert_ne!(manager.spec().tmp, outer_tmp);
            drop(inner);
        }
        assert_eq!(manager.isolation_depth(), 1);
        assert_eq!(manager.spec().tmp, outer_tmp);
        drop(outer);
        assert_eq!(manager.isolation_depth(), 0);
        assert_eq!(manager.spec().tmp, "/original/tmp");
    }

    #[rstest]
    fn restores_on_panic(manager: LogManager) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = IsolatedLogSetup::new().enter_with(&manager).expect("enter");
            manager.setup(SetupOptions::new().without_greeting()).expect("setup");
            panic!("test body failed");
        }));
        assert!(result.is_err());
        assert_eq!(manager.isolation_depth(), 0);
        assert!(!manager.is_set_up());
        assert_eq!(manager.spec().tmp, "/original/tmp");
        assert_eq!(manager.root_handlers().len(), 1);
    }
}

//! Owner of the process-wide logging state.
//!
//! A [`LogManager`] holds the live [`LogSpec`], the default spec that
//! [`LogManager::reset`] restores, the [`LogContext`], the root handler list
//! and the isolation counter. The process-wide instance is reached through
//! [`global`]; independent managers can be built for embedding and tests.
//!
//! Records are dispatched synchronously to a snapshot of the root handler
//! list. Handlers queue them for their own worker thread, so dispatch never
//! blocks on I/O.

mod setup;

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};

use crate::context::LogContext;
use crate::formatter;
use crate::handler::{HandlerError, LogHandler};
use crate::level::LogLevel;
use crate::log_record::LogRecord;
use crate::spec::{LogSpec, SpecError, SpecValue};

pub use setup::{DEFAULT_GREETING, SetupError, SetupOptions};

/// Root level used until setup or [`LogManager::set_default_level`] says otherwise.
pub const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Warn;

static GLOBAL: Lazy<LogManager> = Lazy::new(LogManager::default);

/// The process-wide manager used by the `log` bridge.
pub fn global() -> &'static LogManager {
    &GLOBAL
}

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as dispatching; records logged by handlers
/// while the mark is set are dropped instead of recursing.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Option<Self> {
        DISPATCHING.with(|flag| (!flag.replace(true)).then_some(DispatchGuard))
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

#[derive(Default)]
struct SetupState {
    active: bool,
    installed: Vec<Arc<dyn LogHandler>>,
    file_location: Option<PathBuf>,
}

pub struct LogManager {
    spec: RwLock<LogSpec>,
    default_spec: RwLock<LogSpec>,
    context: LogContext,
    root_handlers: RwLock<Vec<Arc<dyn LogHandler>>>,
    root_level: AtomicU8,
    default_level: AtomicU8,
    state: Mutex<SetupState>,
    silenced: RwLock<Vec<String>>,
    isolation: AtomicUsize,
    dryrun: AtomicBool,
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new(LogSpec::default())
    }
}

impl LogManager {
    /// Build a manager whose live and default spec start as `spec`.
    pub fn new(spec: LogSpec) -> Self {
        Self {
            spec: RwLock::new(spec.clone()),
            default_spec: RwLock::new(spec),
            context: LogContext::new(),
            root_handlers: RwLock::new(Vec::new()),
            root_level: AtomicU8::new(DEFAULT_ROOT_LEVEL.into()),
            default_level: AtomicU8::new(DEFAULT_ROOT_LEVEL.into()),
            state: Mutex::new(SetupState::default()),
            silenced: RwLock::new(Vec::new()),
            isolation: AtomicUsize::new(0),
            dryrun: AtomicBool::new(false),
        }
    }

    /// Snapshot of the live spec.
    pub fn spec(&self) -> LogSpec {
        self.spec.read().clone()
    }

    /// Snapshot of the spec [`reset`](Self::reset) restores.
    pub fn default_spec(&self) -> LogSpec {
        self.default_spec.read().clone()
    }

    /// Mutate the live spec in place. The default spec is untouched.
    pub fn update_spec<R>(&self, f: impl FnOnce(&mut LogSpec) -> R) -> R {
        f(&mut self.spec.write())
    }

    /// Apply `overrides` to both the default and the live spec.
    pub fn override_spec<K, V>(
        &self,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), SpecError>
    where
        K: AsRef<str>,
        V: Into<SpecValue>,
    {
        let overrides: Vec<(String, SpecValue)> = overrides
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.into()))
            .collect();
        self.default_spec.write().set_overrides(overrides.clone())?;
        self.spec.write().set_overrides(overrides)
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.root_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.root_level.store(level.into(), Ordering::Relaxed);
    }

    /// Change the root level [`reset`](Self::reset) returns to, and apply it now.
    pub fn set_default_level(&self, level: LogLevel) {
        self.default_level.store(level.into(), Ordering::Relaxed);
        self.set_level(level);
    }

    pub fn is_dryrun(&self) -> bool {
        self.dryrun.load(Ordering::Relaxed)
    }

    pub fn set_dryrun(&self, dryrun: bool) {
        self.dryrun.store(dryrun, Ordering::Relaxed);
    }

    /// Drop records whose target starts with `prefix`.
    pub fn silence(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        let mut silenced = self.silenced.write();
        if !silenced.contains(&prefix) {
            silenced.push(prefix);
        }
    }

    fn is_silenced(&self, target: &str) -> bool {
        self.silenced
            .read()
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }

    /// Whether a record from `target` at `level` would be dispatched.
    pub fn is_enabled(&self, target: &str, level: LogLevel) -> bool {
        self.level().admits(level) && !self.is_silenced(target)
    }

    /// Whether any of the whitespace-separated `markers` appears in the live
    /// console or file format.
    pub fn is_using_format(&self, markers: &str) -> bool {
        let spec = self.spec.read();
        [&spec.console_format, &spec.file_format]
            .into_iter()
            .flatten()
            .any(|format| formatter::is_using_format(markers, format))
    }

    pub fn root_handlers(&self) -> Vec<Arc<dyn LogHandler>> {
        self.root_handlers.read().clone()
    }

    /// Replace the root handler list, returning the previous one.
    pub fn set_root_handlers(
        &self,
        handlers: Vec<Arc<dyn LogHandler>>,
    ) -> Vec<Arc<dyn LogHandler>> {
        std::mem::replace(&mut *self.root_handlers.write(), handlers)
    }

    pub fn add_handler(&self, handler: Arc<dyn LogHandler>) {
        self.root_handlers.write().push(handler);
    }

    /// Remove `handler` from the root list. Returns `true` when it was present.
    pub fn remove_handler(&self, handler: &Arc<dyn LogHandler>) -> bool {
        let mut handlers = self.root_handlers.write();
        match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(pos) => {
                handlers.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Flush every root handler; `false` if any flush was not confirmed.
    pub fn flush(&self) -> bool {
        self.root_handlers()
            .iter()
            .fold(true, |ok, handler| handler.flush() && ok)
    }

    pub fn is_set_up(&self) -> bool {
        self.state.lock().active
    }

    /// Log file chosen by the last [`setup`](Self::setup), if any.
    pub fn file_location(&self) -> Option<PathBuf> {
        self.state.lock().file_location.clone()
    }

    pub fn has_file_handler(&self) -> bool {
        self.state.lock().file_location.is_some()
    }

    /// Number of isolation scopes currently entered.
    pub fn isolation_depth(&self) -> usize {
        self.isolation.load(Ordering::SeqCst)
    }

    pub(crate) fn enter_isolation(&self) {
        self.isolation.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn exit_isolation(&self) {
        let _ = self
            .isolation
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1));
    }

    /// Log `message` with the context of the calling thread attached.
    pub fn emit(&self, target: &str, level: LogLevel, message: &str) {
        if !self.is_enabled(target, level) {
            return;
        }
        self.dispatch(LogRecord::new(target, level, message).with_context(self.context.rendered()));
    }

    /// Dispatch an already built record to the root handlers.
    ///
    /// The record's context is used as-is; see [`emit`](Self::emit).
    pub fn log(&self, record: LogRecord) {
        if !self.is_enabled(&record.logger, record.level) {
            return;
        }
        self.dispatch(record);
    }

    fn dispatch(&self, record: LogRecord) {
        let Some(_guard) = DispatchGuard::enter() else {
            return;
        };
        let handlers = self.root_handlers();
        for handler in &handlers {
            match handler.handle(record.clone()) {
                // The worker reports dropped records itself, rate limited.
                Ok(()) | Err(HandlerError::QueueFull) => {}
                Err(err) => eprintln!("logsetup: failed to dispatch record: {err}"),
            }
        }
    }

    /// Undo [`setup`](Self::setup) and return to the default state.
    ///
    /// Handlers installed by setup are flushed and removed (other root
    /// handlers stay), the default spec and root level are restored, both
    /// context scopes are cleared (the thread-local one for the calling
    /// thread), silenced targets are forgotten and dryrun is turned off.
    pub fn reset(&self) {
        let installed = {
            let mut state = self.state.lock();
            state.active = false;
            state.file_location = None;
            std::mem::take(&mut state.installed)
        };
        self.root_handlers
            .write()
            .retain(|h| !installed.iter().any(|i| Arc::ptr_eq(h, i)));
        for handler in &installed {
            handler.flush();
        }
        drop(installed);
        *self.spec.write() = self.default_spec.read().clone();
        self.context.clear_global();
        self.context.clear_threadlocal();
        self.silenced.write().clear();
        self.set_dryrun(false);
        self.set_level(LogLevel::from_u8(self.default_level.load(Ordering::Relaxed)));
    }
}

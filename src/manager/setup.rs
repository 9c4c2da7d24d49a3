//! One-shot installation of console and file handlers from a [`LogSpec`].

use std::env;
use std::path::Path;
use std::process;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::LogManager;
use crate::formatter::PercentFormatter;
use crate::handler::LogHandler;
use crate::handlers::{FileHandler, StreamHandler};
use crate::level::LogLevel;
use crate::log_compat;
use crate::spec::{LogSpec, SpecError, SpecValue};
use crate::template;

/// Greeting logged at debug level once setup completes.
pub const DEFAULT_GREETING: &str = "{actual_location}, {pid}";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("logging is already set up; call reset() first")]
    AlreadySetUp,
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Arguments to [`LogManager::setup`].
///
/// Every LogSpec field can be overridden by name; `level` forces the console
/// level, `dryrun` turns on dryrun mode and defaults the level to DEBUG.
#[derive(Clone, Debug)]
pub struct SetupOptions {
    overrides: Vec<(String, SpecValue)>,
    level: Option<LogLevel>,
    greeting: Vec<String>,
    dryrun: Option<bool>,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            overrides: Vec::new(),
            level: None,
            greeting: vec![DEFAULT_GREETING.to_string()],
            dryrun: None,
        }
    }
}

impl SetupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<SpecValue>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Replace the greeting with `greeting`, one line per `\n`.
    pub fn with_greeting(mut self, greeting: &str) -> Self {
        self.greeting = greeting.lines().map(str::to_string).collect();
        self
    }

    pub fn without_greeting(mut self) -> Self {
        self.greeting.clear();
        self
    }

    pub fn with_dryrun(mut self, dryrun: bool) -> Self {
        self.dryrun = Some(dryrun);
        self
    }
}

impl LogManager {
    /// Install handlers according to the live spec plus `options`.
    ///
    /// The console handler goes in first so diagnostics about file locations
    /// reach it. Unusable file locations are not errors: they are reported
    /// at debug level and logging continues on the console only.
    pub fn setup(&self, options: SetupOptions) -> Result<(), SetupError> {
        let mut state = self.state.lock();
        if state.active {
            return Err(SetupError::AlreadySetUp);
        }
        log_compat::install();

        let mut spec = self.spec();
        spec.set_overrides(options.overrides)?;
        if let Some(dryrun) = options.dryrun {
            self.set_dryrun(dryrun);
        }
        let level = options
            .level
            .or_else(|| self.is_dryrun().then_some(LogLevel::Debug));
        *self.spec.write() = spec.clone();

        let mut installed: Vec<Arc<dyn LogHandler>> = Vec::new();
        let mut most_verbose: Option<LogLevel> = None;

        if let Some(format) = &spec.console_format {
            let console_level = level.unwrap_or(spec.console_level);
            let formatter = PercentFormatter::with_timezone(format, spec.timezone.as_deref());
            let handler: Arc<dyn LogHandler> =
                Arc::new(StreamHandler::new(&spec.console_stream, formatter, console_level));
            self.add_handler(Arc::clone(&handler));
            installed.push(handler);
            most_verbose = Some(console_level);
            self.set_level(console_level);
        }

        let mut file_location = None;
        if let (true, Some(format)) = (spec.should_log_to_file(), &spec.file_format) {
            match spec.usable_location() {
                Some(path) => {
                    let formatter =
                        PercentFormatter::with_timezone(format, spec.timezone.as_deref());
                    match FileHandler::open(&path, formatter, spec.file_level) {
                        Ok(handler) => {
                            let handler: Arc<dyn LogHandler> = Arc::new(handler);
                            self.add_handler(Arc::clone(&handler));
                            installed.push(handler);
                            most_verbose = Some(
                                most_verbose.map_or(spec.file_level, |l| l.min(spec.file_level)),
                            );
                            file_location = Some(path);
                        }
                        Err(err) => debug!("Can't log to {}: {err}", path.display()),
                    }
                }
                None => match &spec.custom_location {
                    Some(custom) => debug!("Can't log to {custom}"),
                    None => debug!("No usable log locations"),
                },
            }
        }

        if let Some(level) = most_verbose {
            self.set_level(level);
        }
        state.active = true;
        state.installed = installed;
        state.file_location = file_location.clone();
        drop(state);

        for line in &options.greeting {
            let text = greeting_line(line, &spec, file_location.as_deref());
            self.emit(module_path!(), LogLevel::Debug, &text);
        }
        Ok(())
    }
}

fn greeting_line(line: &str, spec: &LogSpec, location: Option<&Path>) -> String {
    let lookup = |key: &str| match key {
        "actual_location" => Some(match location {
            Some(path) => format!("Logging to {}", path.display()),
            None => "Not logging to file".to_string(),
        }),
        "location" => Some(location.map(|p| p.display().to_string()).unwrap_or_default()),
        "pid" => Some(format!("pid {}", process::id())),
        "argv" => Some(env::args().collect::<Vec<_>>().join(" ")),
        "appname" => spec.appname.clone(),
        _ => None,
    };
    template::formatted(line, lookup, false).unwrap_or_else(|| line.to_string())
}

//! The logging configuration record.
//!
//! A [`LogSpec`] describes where and how logging should be set up before any
//! handler exists: target app name, time zone label, candidate file
//! locations, line formats and the console stream. Fields are public and
//! typed; [`LogSpec::set`] and [`LogSpec::with_field`] apply sparse, named
//! overrides with validation for callers that configure by name.

mod location;
mod value;

use std::env;
use std::path::Path;

use chrono::Local;
use serde_json::Value;

use crate::handlers::ConsoleStream;
use crate::level::LogLevel;

pub use value::{SpecError, SpecField, SpecSource, SpecValue};

/// Default basename template.
pub const DEFAULT_BASENAME: &str = "{appname}.log";
/// Default console line format.
pub const DEFAULT_CONSOLE_FORMAT: &str = "%(asctime)s %(levelname)s %(message)s";
/// Default file line format.
pub const DEFAULT_FILE_FORMAT: &str =
    "%(asctime)s %(timezone)s %(context)s%(levelname)s - %(message)s";
/// Location templates tried when no custom location is given.
pub const DEFAULT_LOCATIONS: [&str; 2] = ["/logs/{appname}/{basename}", "/var/log/{basename}"];

#[derive(Clone, Debug, PartialEq)]
pub struct LogSpec {
    /// Application name, used to build the default basename.
    pub appname: Option<String>,
    /// Log file name template, usually `"{appname}.log"`.
    pub basename: String,
    /// Label rendered by `%(timezone)s`; `None` or empty drops the token.
    pub timezone: Option<String>,
    /// Folder substituted for `{tmp}` in location templates.
    pub tmp: String,
    /// Candidate location templates, tried in order.
    pub locations: Option<Vec<String>>,
    /// Explicit log file; `Some("")` disables file logging.
    pub custom_location: Option<String>,
    /// Console line format; `None` disables console logging.
    pub console_format: Option<String>,
    /// File line format; `None` disables file logging.
    pub file_format: Option<String>,
    pub console_stream: ConsoleStream,
    pub console_level: LogLevel,
    pub file_level: LogLevel,
}

impl Default for LogSpec {
    fn default() -> Self {
        Self {
            appname: program_basename(),
            basename: DEFAULT_BASENAME.to_string(),
            timezone: Some(default_timezone()),
            tmp: env::temp_dir().display().to_string(),
            locations: Some(DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect()),
            custom_location: None,
            console_format: Some(DEFAULT_CONSOLE_FORMAT.to_string()),
            file_format: Some(DEFAULT_FILE_FORMAT.to_string()),
            console_stream: ConsoleStream::Stderr,
            console_level: LogLevel::Warn,
            file_level: LogLevel::Debug,
        }
    }
}

impl LogSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one named override, failing fast on unknown names.
    pub fn with_field(&mut self, name: &str, value: impl Into<SpecValue>) -> Result<(), SpecError> {
        let field: SpecField = name.parse()?;
        self.apply(field, value.into())
    }

    /// Apply a value to an already resolved field.
    pub fn apply(&mut self, field: SpecField, value: SpecValue) -> Result<(), SpecError> {
        match field {
            SpecField::Appname => self.appname = value::optional_text(field, value)?,
            SpecField::Basename => self.basename = value::required_text(field, value)?,
            SpecField::Timezone => {
                let timezone = value::optional_text(field, value)?;
                if let Some(label) = &timezone {
                    value::validate_timezone(field, label)?;
                }
                self.timezone = timezone;
            }
            SpecField::Tmp => self.tmp = value::required_text(field, value)?,
            SpecField::Locations => self.locations = value::optional_list(field, value)?,
            SpecField::CustomLocation => {
                self.custom_location = value::optional_text(field, value)?;
            }
            SpecField::ConsoleFormat => self.console_format = value::optional_text(field, value)?,
            SpecField::FileFormat => self.file_format = value::optional_text(field, value)?,
            SpecField::ConsoleStream => self.console_stream = value::stream(field, value)?,
            SpecField::ConsoleLevel => self.console_level = value::level(field, value)?,
            SpecField::FileLevel => self.file_level = value::level(field, value)?,
        }
        Ok(())
    }

    /// Merge `sources` in order, then apply `overrides` in order.
    ///
    /// A [`SpecSource::Spec`] copies every field of the other spec; a
    /// [`SpecSource::Json`] must be an object and copies only the keys it
    /// holds. Each assignment is validated and applied independently, so a
    /// failure leaves earlier assignments in place.
    pub fn set<K, V>(
        &mut self,
        sources: &[SpecSource<'_>],
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), SpecError>
    where
        K: AsRef<str>,
        V: Into<SpecValue>,
    {
        for source in sources {
            match source {
                SpecSource::Spec(other) => self.clone_from(other),
                SpecSource::Json(value) => self.merge_json(value)?,
            }
        }
        for (name, value) in overrides {
            self.with_field(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Apply only named overrides.
    pub fn set_overrides<K, V>(
        &mut self,
        overrides: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), SpecError>
    where
        K: AsRef<str>,
        V: Into<SpecValue>,
    {
        self.set(&[], overrides)
    }

    fn merge_json(&mut self, value: &Value) -> Result<(), SpecError> {
        let Value::Object(map) = value else {
            return Err(SpecError::InvalidSource(value::describe_json(value)));
        };
        for (key, item) in map {
            let field: SpecField = key.parse()?;
            self.apply(field, SpecValue::from_json(field, item)?)?;
        }
        Ok(())
    }
}

/// File stem of the running program, if it can be determined.
pub fn program_basename() -> Option<String> {
    env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
}

fn default_timezone() -> String {
    if let Ok(tz) = env::var("TZ") {
        let tz = tz.trim_start_matches(':');
        if !tz.is_empty() && value::validate_timezone(SpecField::Timezone, tz).is_ok() {
            return tz.to_string();
        }
    }
    let now = Local::now();
    if now.offset().local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        format!("UTC{}", now.format("%:z"))
    }
}

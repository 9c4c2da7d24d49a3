//! Named fields and dynamically typed values accepted by [`LogSpec::set`].
//!
//! [`LogSpec::set`]: super::LogSpec::set

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use super::LogSpec;
use crate::handlers::ConsoleStream;
use crate::level::LogLevel;

/// Errors raised while configuring a [`LogSpec`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The override key does not name a field.
    #[error("{0:?} is not a LogSpec field")]
    UnknownField(String),
    /// The value has the wrong shape or fails validation for the field.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: SpecField, reason: String },
    /// A positional source was neither a LogSpec nor a mapping.
    #[error("can't merge LogSpec from {0}")]
    InvalidSource(String),
}

/// Every configurable LogSpec field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecField {
    Appname,
    Basename,
    Timezone,
    Tmp,
    Locations,
    CustomLocation,
    ConsoleFormat,
    FileFormat,
    ConsoleStream,
    ConsoleLevel,
    FileLevel,
}

impl SpecField {
    pub const ALL: [SpecField; 11] = [
        SpecField::Appname,
        SpecField::Basename,
        SpecField::Timezone,
        SpecField::Tmp,
        SpecField::Locations,
        SpecField::CustomLocation,
        SpecField::ConsoleFormat,
        SpecField::FileFormat,
        SpecField::ConsoleStream,
        SpecField::ConsoleLevel,
        SpecField::FileLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecField::Appname => "appname",
            SpecField::Basename => "basename",
            SpecField::Timezone => "timezone",
            SpecField::Tmp => "tmp",
            SpecField::Locations => "locations",
            SpecField::CustomLocation => "custom_location",
            SpecField::ConsoleFormat => "console_format",
            SpecField::FileFormat => "file_format",
            SpecField::ConsoleStream => "console_stream",
            SpecField::ConsoleLevel => "console_level",
            SpecField::FileLevel => "file_level",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecField {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| SpecError::UnknownField(s.to_string()))
    }
}

/// A value for one field; the receiving field decides which shapes it accepts.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecValue {
    Unset,
    Text(String),
    List(Vec<String>),
    Level(LogLevel),
    Stream(ConsoleStream),
}

impl SpecValue {
    fn kind(&self) -> &'static str {
        match self {
            SpecValue::Unset => "unset",
            SpecValue::Text(_) => "text",
            SpecValue::List(_) => "a list",
            SpecValue::Level(_) => "a level",
            SpecValue::Stream(_) => "a stream",
        }
    }

    /// Convert a JSON mapping value.
    pub fn from_json(field: SpecField, value: &Value) -> Result<Self, SpecError> {
        match value {
            Value::Null => Ok(SpecValue::Unset),
            Value::String(text) => Ok(SpecValue::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => Ok(text.clone()),
                    other => Err(invalid(field, format!("expected strings, got {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(SpecValue::List),
            other => Err(invalid(field, format!("unsupported value {other}"))),
        }
    }

    /// Interpret a textual value, as found in a spec file.
    ///
    /// `locations` is split on commas; every other field takes the text as-is.
    pub fn parse(field: SpecField, text: &str) -> Self {
        match field {
            SpecField::Locations => SpecValue::List(
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => SpecValue::Text(text.to_string()),
        }
    }
}

pub(super) fn invalid(field: SpecField, reason: impl Into<String>) -> SpecError {
    SpecError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

pub(super) fn optional_text(field: SpecField, value: SpecValue) -> Result<Option<String>, SpecError> {
    match value {
        SpecValue::Unset => Ok(None),
        SpecValue::Text(text) => Ok(Some(text)),
        other => Err(invalid(field, format!("expected text, got {}", other.kind()))),
    }
}

pub(super) fn required_text(field: SpecField, value: SpecValue) -> Result<String, SpecError> {
    optional_text(field, value)?.ok_or_else(|| invalid(field, "can't be unset"))
}

pub(super) fn optional_list(
    field: SpecField,
    value: SpecValue,
) -> Result<Option<Vec<String>>, SpecError> {
    match value {
        SpecValue::Unset => Ok(None),
        SpecValue::Text(text) => Ok(Some(vec![text])),
        SpecValue::List(items) => Ok(Some(items)),
        other => Err(invalid(field, format!("expected a list, got {}", other.kind()))),
    }
}

pub(super) fn level(field: SpecField, value: SpecValue) -> Result<LogLevel, SpecError> {
    match value {
        SpecValue::Level(level) => Ok(level),
        SpecValue::Text(text) => text.parse().map_err(|e| invalid(field, format!("{e}"))),
        other => Err(invalid(field, format!("expected a level, got {}", other.kind()))),
    }
}

pub(super) fn stream(field: SpecField, value: SpecValue) -> Result<ConsoleStream, SpecError> {
    match value {
        SpecValue::Stream(stream) => Ok(stream),
        SpecValue::Text(name) => ConsoleStream::from_name(&name)
            .ok_or_else(|| invalid(field, format!("unknown stream {name:?}"))),
        other => Err(invalid(field, format!("expected a stream, got {}", other.kind()))),
    }
}

/// Accept empty labels or labels such as `UTC`, `PST`, `UTC+02:00` or
/// `Europe/Paris`.
pub(super) fn validate_timezone(field: SpecField, timezone: &str) -> Result<(), SpecError> {
    if timezone.is_empty() {
        return Ok(());
    }
    let starts_upper = timezone.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '/' | ':');
    if starts_upper && timezone.chars().all(allowed) {
        Ok(())
    } else {
        Err(invalid(field, format!("{timezone:?} is not a time zone label")))
    }
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        SpecValue::Text(value.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(value: String) -> Self {
        SpecValue::Text(value)
    }
}

impl From<&Path> for SpecValue {
    fn from(value: &Path) -> Self {
        SpecValue::Text(value.display().to_string())
    }
}

impl From<PathBuf> for SpecValue {
    fn from(value: PathBuf) -> Self {
        SpecValue::from(value.as_path())
    }
}

impl<T: Into<SpecValue>> From<Option<T>> for SpecValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SpecValue::Unset, Into::into)
    }
}

impl From<Vec<String>> for SpecValue {
    fn from(value: Vec<String>) -> Self {
        SpecValue::List(value)
    }
}

impl From<Vec<&str>> for SpecValue {
    fn from(value: Vec<&str>) -> Self {
        SpecValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<LogLevel> for SpecValue {
    fn from(value: LogLevel) -> Self {
        SpecValue::Level(value)
    }
}

impl From<ConsoleStream> for SpecValue {
    fn from(value: ConsoleStream) -> Self {
        SpecValue::Stream(value)
    }
}

/// A positional source merged by [`LogSpec::set`].
#[derive(Clone, Copy, Debug)]
pub enum SpecSource<'a> {
    /// Copy every field of another spec.
    Spec(&'a LogSpec),
    /// Copy the keys present in a JSON object.
    Json(&'a Value),
}

impl<'a> From<&'a LogSpec> for SpecSource<'a> {
    fn from(spec: &'a LogSpec) -> Self {
        SpecSource::Spec(spec)
    }
}

impl<'a> From<&'a Value> for SpecSource<'a> {
    fn from(value: &'a Value) -> Self {
        SpecSource::Json(value)
    }
}

pub(super) fn describe_json(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "a boolean".into(),
        Value::Number(_) => "a number".into(),
        Value::String(text) => format!("string {text:?}"),
        Value::Array(_) => "an array".into(),
        Value::Object(_) => "an object".into(),
    }
}

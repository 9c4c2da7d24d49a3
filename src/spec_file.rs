//! Loading [`LogSpec`] overrides from an INI file.
//!
//! Only the `[logsetup]` section is read. Its keys are LogSpec field names;
//! `locations` takes a comma-separated list. Files are decoded with
//! `encoding_rs` so deployments can ship non UTF-8 config files.
//!
//! ```ini
//! [logsetup]
//! appname = billing
//! locations = {tmp}/{basename}, /var/log/{basename}
//! console_level = info
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use encoding_rs::Encoding;
use ini::Ini;
use thiserror::Error;

use crate::spec::{LogSpec, SpecError, SpecField, SpecValue};

/// Section holding LogSpec overrides.
pub const SPEC_SECTION: &str = "logsetup";

#[derive(Debug, Error)]
pub enum SpecFileError {
    #[error("{0} doesn't exist")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is an empty file")]
    Empty(String),
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    #[error("{path} is not valid {encoding}")]
    Decode { path: String, encoding: String },
    #[error("{path} is invalid: {message}")]
    Invalid { path: String, message: String },
    #[error("{path}: {source}")]
    Value {
        path: String,
        #[source]
        source: SpecError,
    },
}

/// Overrides read from the `[logsetup]` section, in file order.
pub fn read_overrides(
    path: impl AsRef<Path>,
    encoding: Option<&str>,
) -> Result<Vec<(SpecField, SpecValue)>, SpecFileError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let bytes = read_file_bytes(path, &display)?;
    if bytes.is_empty() {
        return Err(SpecFileError::Empty(display));
    }
    let text = decode_with_encoding(&bytes, encoding.unwrap_or("utf-8"), &display)?;
    parse_overrides(&display, &text)
}

/// Apply the overrides found in `path` to `spec`.
pub fn apply_file(
    spec: &mut LogSpec,
    path: impl AsRef<Path>,
    encoding: Option<&str>,
) -> Result<(), SpecFileError> {
    let display = path.as_ref().display().to_string();
    for (field, value) in read_overrides(path, encoding)? {
        spec.apply(field, value).map_err(|source| SpecFileError::Value {
            path: display.clone(),
            source,
        })?;
    }
    Ok(())
}

fn read_file_bytes(path: &Path, display: &str) -> Result<Vec<u8>, SpecFileError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => SpecFileError::NotFound(display.to_string()),
        _ => SpecFileError::Io {
            path: display.to_string(),
            source: err,
        },
    })
}

fn decode_with_encoding(bytes: &[u8], label: &str, display: &str) -> Result<String, SpecFileError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| SpecFileError::UnknownEncoding(label.to_string()))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(SpecFileError::Decode {
            path: display.to_string(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(decoded.into_owned())
}

fn parse_overrides(display: &str, text: &str) -> Result<Vec<(SpecField, SpecValue)>, SpecFileError> {
    let ini = Ini::load_from_str(text).map_err(|err| SpecFileError::Invalid {
        path: display.to_string(),
        message: err.to_string(),
    })?;
    let Some(section) = ini.section(Some(SPEC_SECTION)) else {
        return Ok(Vec::new());
    };
    section
        .iter()
        .map(|(key, value)| {
            let field: SpecField = key.trim().parse().map_err(|source| SpecFileError::Value {
                path: display.to_string(),
                source,
            })?;
            Ok((field, parse_value(field, value.trim())))
        })
        .collect()
}

fn parse_value(field: SpecField, text: &str) -> SpecValue {
    if text.eq_ignore_ascii_case("none") {
        return SpecValue::Unset;
    }
    SpecValue::parse(field, text)
}

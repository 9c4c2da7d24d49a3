//! Percent-style format strings (`"%(asctime)s %(levelname)s %(message)s"`).
//!
//! The format string is parsed once into segments. `%(timezone)s` is baked
//! in at construction because the time zone label is fixed for the lifetime
//! of a handler; when no label is configured the token disappears together
//! with one adjacent space so lines do not carry a double gap.

use std::path::Path;

use chrono::{DateTime, Local};

use super::{LogFormatter, context_prefix};
use crate::log_record::LogRecord;

const TIMEZONE_TOKEN: &str = "%(timezone)s";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    AscTime,
    Name,
    LevelName,
    Message,
    Context,
    ThreadName,
    Process,
    FileName,
    PathName,
    Module,
    LineNo,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "asctime" => Self::AscTime,
            "name" => Self::Name,
            "levelname" => Self::LevelName,
            "message" => Self::Message,
            "context" => Self::Context,
            "threadName" => Self::ThreadName,
            "process" => Self::Process,
            "filename" => Self::FileName,
            "pathname" => Self::PathName,
            "module" => Self::Module,
            "lineno" => Self::LineNo,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        left_align: bool,
        width: usize,
    },
}

/// Formatter driven by a percent-style template.
#[derive(Clone, Debug)]
pub struct PercentFormatter {
    segments: Vec<Segment>,
}

impl PercentFormatter {
    /// Parse `format` without a time zone label.
    pub fn new(format: &str) -> Self {
        Self::with_timezone(format, None)
    }

    /// Parse `format`, substituting `%(timezone)s` with `timezone`.
    pub fn with_timezone(format: &str, timezone: Option<&str>) -> Self {
        let baked = bake_timezone(format, timezone);
        Self {
            segments: parse(&baked),
        }
    }

    fn render_field(field: Field, record: &LogRecord) -> String {
        let meta = &record.metadata;
        match field {
            Field::AscTime => DateTime::<Local>::from(meta.timestamp)
                .format("%Y-%m-%d %H:%M:%S,%3f")
                .to_string(),
            Field::Name => record.logger.clone(),
            Field::LevelName => record.level.to_string(),
            Field::Message => record.message.clone(),
            Field::Context => context_prefix(&record.context),
            Field::ThreadName => meta
                .thread_name
                .clone()
                .unwrap_or_else(|| format!("{:?}", meta.thread_id)),
            Field::Process => std::process::id().to_string(),
            Field::FileName => Path::new(&meta.filename)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Field::PathName => meta.filename.clone(),
            Field::Module => Path::new(&meta.filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .or_else(|| meta.module_path.rsplit("::").next().map(str::to_string))
                .unwrap_or_default(),
            Field::LineNo => meta.line_number.to_string(),
        }
    }
}

impl LogFormatter for PercentFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    field,
                    left_align,
                    width,
                } => {
                    let value = Self::render_field(*field, record);
                    if *left_align {
                        out.push_str(&format!("{value:<width$}"));
                    } else {
                        out.push_str(&format!("{value:>width$}"));
                    }
                }
            }
        }
        out
    }
}

fn bake_timezone(format: &str, timezone: Option<&str>) -> String {
    match timezone.filter(|tz| !tz.is_empty()) {
        Some(tz) => format.replace(TIMEZONE_TOKEN, &tz.replace('%', "%%")),
        None => format
            .replace(&format!("{TIMEZONE_TOKEN} "), "")
            .replace(&format!(" {TIMEZONE_TOKEN}"), "")
            .replace(TIMEZONE_TOKEN, ""),
    }
}

fn parse(format: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = format;
    while let Some(pos) = rest.find('%') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(stripped) = after.strip_prefix('%') {
            literal.push('%');
            rest = stripped;
            continue;
        }
        match parse_token(after) {
            Some((key, left_align, width, consumed)) => {
                let raw = &rest[pos..pos + 1 + consumed];
                match Field::from_key(key) {
                    Some(field) => {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Field {
                            field,
                            left_align,
                            width,
                        });
                    }
                    None => literal.push_str(raw),
                }
                rest = &after[consumed..];
            }
            None => {
                literal.push('%');
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Parse `(key)[-][width][.precision]conv`, returning the key, alignment,
/// width and the number of bytes consumed.
fn parse_token(text: &str) -> Option<(&str, bool, usize, usize)> {
    let body = text.strip_prefix('(')?;
    let close = body.find(')')?;
    let key = &body[..close];
    let spec = &body[close + 1..];
    let mut idx = 0;
    let bytes = spec.as_bytes();
    let left_align = bytes.first() == Some(&b'-');
    if left_align {
        idx += 1;
    }
    let width_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let width = spec[width_start..idx].parse().unwrap_or(0);
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
    }
    if !bytes.get(idx)?.is_ascii_alphabetic() {
        return None;
    }
    idx += 1;
    Some((key, left_align, width, 1 + close + 1 + idx))
}

/// Whether any of the whitespace-separated `markers` appears in `format`.
pub fn is_using_format(markers: &str, format: &str) -> bool {
    if markers.is_empty() || format.is_empty() {
        return false;
    }
    markers.split_whitespace().any(|marker| format.contains(marker))
}

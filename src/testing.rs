//! Stable defaults for test suites (`test-util` feature).
//!
//! Tests that call [`apply_test_defaults`] get a global manager whose spec
//! uses `UTC`, `/tmp` and a single `{tmp}/{basename}` location, with the
//! root level lowered to DEBUG so debug diagnostics can be asserted on.

use crate::level::LogLevel;
use crate::manager::{self, LogManager};
use crate::spec::{LogSpec, SpecError, SpecValue};

/// Overrides applied by [`apply_test_defaults`].
pub fn test_overrides() -> Vec<(&'static str, SpecValue)> {
    vec![
        ("timezone", SpecValue::from("UTC")),
        ("tmp", SpecValue::from("/tmp")),
        ("locations", SpecValue::from(vec!["{tmp}/{basename}"])),
        ("console_level", SpecValue::from(LogLevel::Debug)),
    ]
}

/// A spec with the test defaults applied.
pub fn test_spec() -> Result<LogSpec, SpecError> {
    let mut spec = LogSpec::default();
    spec.set_overrides(test_overrides())?;
    Ok(spec)
}

/// Apply the test defaults to `manager`, default and live spec alike.
pub fn apply_test_defaults_to(manager: &LogManager) -> Result<(), SpecError> {
    manager.override_spec(test_overrides())?;
    manager.set_default_level(LogLevel::Debug);
    Ok(())
}

/// Apply the test defaults to the process-wide manager.
pub fn apply_test_defaults() -> Result<(), SpecError> {
    apply_test_defaults_to(manager::global())
}

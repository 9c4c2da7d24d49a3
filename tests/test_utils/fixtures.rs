//! Fixtures for tests that drive the process-wide manager.
//!
//! Every fixture here touches global state, so tests using them must be
//! marked `#[serial]`.

use logsetup::testing::apply_test_defaults;
use logsetup::{
    ConsoleStream, IsolatedLogSetup, IsolationGuard, LogLevel, SetupOptions, SharedBuffer,
};
use rstest::fixture;

/// Global manager with test defaults, isolated in a fresh temp folder.
#[fixture]
pub fn isolated() -> IsolationGuard<'static> {
    apply_test_defaults().expect("test defaults are valid");
    IsolatedLogSetup::new().enter().expect("enter isolation")
}

/// Setup options sending DEBUG console output to `buffer` as
/// `"LEVEL message"` lines.
pub fn buffered_options(buffer: &SharedBuffer) -> SetupOptions {
    SetupOptions::new()
        .with_field("appname", "testing")
        .with_field("console_format", "%(levelname)s %(message)s")
        .with_field("console_stream", ConsoleStream::Buffer(buffer.clone()))
        .with_level(LogLevel::Debug)
}

//! Send/Sync guarantees for core types.

use logsetup::{
    CaptureHandler, ConsoleStream, FileHandler, LogContext, LogManager, LogSpec, PercentFormatter,
    SharedBuffer, SharedFormatter, StreamHandler,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn configuration_is_send_sync() {
    assert_impl_all!(LogSpec: Send, Sync, Clone);
    assert_impl_all!(ConsoleStream: Send, Sync);
    assert_impl_all!(SharedBuffer: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(LogManager: Send, Sync);
    assert_impl_all!(LogContext: Send, Sync);
    assert_impl_all!(StreamHandler: Send, Sync);
    assert_impl_all!(FileHandler: Send, Sync);
    assert_impl_all!(CaptureHandler: Send, Sync);
    assert_impl_all!(PercentFormatter: Send, Sync);
    assert_impl_all!(SharedFormatter: Send, Sync);
}

//! End-to-end setup scenarios on the process-wide manager.

mod test_utils;

use std::fs;
use std::process;
use std::sync::Arc;

use logsetup::spec_file::apply_file;
use logsetup::{
    CaptureHandler, IsolatedLogSetup, IsolationGuard, LogHandler, LogLevel, PercentFormatter,
    SetupError, SetupOptions, SharedBuffer, SpecValue, global,
};
use rstest::rstest;
use serial_test::serial;
use test_utils::fixtures::{buffered_options, isolated};

#[rstest]
#[serial]
fn logs_to_tmp_location(isolated: IsolationGuard<'static>) {
    let console = SharedBuffer::new();
    global().setup(buffered_options(&console)).expect("setup");
    let expected = isolated.tmp().expect("temp folder").join("testing.log");
    assert_eq!(global().file_location(), Some(expected.clone()));

    log::info!("hello");
    assert!(global().flush());
    assert_eq!(
        console.contents(),
        format!(
            "DEBUG Logging to {}, pid {}\nINFO hello\n",
            expected.display(),
            process::id()
        )
    );
    let logged = fs::read_to_string(&expected).expect("read log file");
    assert!(logged.ends_with("UTC INFO - hello\n"), "got {logged:?}");
}

#[rstest]
#[serial]
fn context_is_rendered_into_file_lines(#[from(isolated)] _guard: IsolationGuard<'static>) {
    let console = SharedBuffer::new();
    global()
        .setup(buffered_options(&console).without_greeting())
        .expect("setup");
    let context = global().context();
    context.add_global([("version", "1.0")]).expect("valid key");
    context.add_threadlocal([("worker", "joe")]).expect("valid key");

    log::info!("hello");
    assert!(global().flush());
    let path = global().file_location().expect("file logging active");
    let logged = fs::read_to_string(path).expect("read log file");
    assert!(
        logged.ends_with("UTC [[version=1.0,worker=joe]] INFO - hello\n"),
        "got {logged:?}"
    );
}

#[rstest]
#[serial]
fn unusable_custom_location_falls_back_to_console(
    #[from(isolated)] _guard: IsolationGuard<'static>,
) {
    let console = SharedBuffer::new();
    global()
        .setup(
            buffered_options(&console).with_field("custom_location", "/dev/null/somewhere.log"),
        )
        .expect("setup");
    assert!(!global().has_file_handler());
    assert!(global().flush());
    let output = console.contents();
    assert!(output.contains("DEBUG Can't create folder /dev/null"), "got {output:?}");
    assert!(output.contains("DEBUG Can't log to /dev/null/somewhere.log"), "got {output:?}");
    assert!(output.ends_with(&format!("DEBUG Not logging to file, pid {}\n", process::id())));
}

#[rstest]
#[serial]
fn missing_appname_means_no_location(#[from(isolated)] _guard: IsolationGuard<'static>) {
    let console = SharedBuffer::new();
    global()
        .setup(buffered_options(&console).with_field("appname", SpecValue::Unset))
        .expect("setup");
    assert_eq!(global().file_location(), None);
    assert!(global().flush());
    assert!(console.contents().contains("DEBUG No usable log locations"));
}

#[rstest]
#[serial]
fn empty_custom_location_disables_file_logging(
    #[from(isolated)] _guard: IsolationGuard<'static>,
) {
    let console = SharedBuffer::new();
    global()
        .setup(buffered_options(&console).with_field("custom_location", ""))
        .expect("setup");
    assert!(!global().has_file_handler());
    assert!(global().flush());
    assert_eq!(
        console.contents(),
        format!("DEBUG Not logging to file, pid {}\n", process::id())
    );
}

#[rstest]
#[serial]
fn unset_locations_log_to_console_only(#[from(isolated)] _guard: IsolationGuard<'static>) {
    let console = SharedBuffer::new();
    global()
        .setup(
            buffered_options(&console)
                .with_field("locations", SpecValue::Unset)
                .with_field("console_format", "%(context)s%(levelname)s %(message)s"),
        )
        .expect("setup");
    assert_eq!(global().file_location(), None);

    let context = global().context();
    context.add_global([("version", "1.0")]).expect("valid key");
    context.add_threadlocal([("worker", "joe")]).expect("valid key");
    log::info!("hello");
    assert!(global().flush());

    let output = console.contents();
    assert!(!output.contains("No usable log locations"), "got {output:?}");
    assert_eq!(
        output,
        format!(
            "DEBUG Not logging to file, pid {}\n[[version=1.0,worker=joe]] INFO hello\n",
            process::id()
        )
    );
}

#[rstest]
#[serial]
fn setup_twice_is_an_error(#[from(isolated)] _guard: IsolationGuard<'static>) {
    let console = SharedBuffer::new();
    global().setup(buffered_options(&console)).expect("first setup");
    assert_eq!(
        global().setup(buffered_options(&console)),
        Err(SetupError::AlreadySetUp)
    );
}

#[rstest]
#[serial]
fn spec_file_feeds_setup(isolated: IsolationGuard<'static>) {
    let dir = isolated.tmp().expect("temp folder").to_path_buf();
    let ini = dir.join("logging.ini");
    fs::write(&ini, "[logsetup]\nappname = from-file\nbasename = {appname}-custom.log\n")
        .expect("write spec file");
    global()
        .update_spec(|spec| apply_file(spec, &ini, None))
        .expect("apply spec file");
    let console = SharedBuffer::new();
    let options = SetupOptions::new()
        .with_field("console_stream", logsetup::ConsoleStream::Buffer(console.clone()))
        .without_greeting();
    global().setup(options).expect("setup");
    assert_eq!(global().file_location(), Some(dir.join("from-file-custom.log")));
}

#[rstest]
#[serial]
fn isolation_restores_global_state() {
    logsetup::testing::apply_test_defaults().expect("test defaults are valid");
    let before_tmp = global().spec().tmp;
    {
        let guard = IsolatedLogSetup::new().enter().expect("enter isolation");
        assert_eq!(global().isolation_depth(), 1);
        let console = SharedBuffer::new();
        global().setup(buffered_options(&console)).expect("setup");
        assert!(global().is_set_up());
        assert_ne!(global().spec().tmp, before_tmp);
        drop(guard);
    }
    assert_eq!(global().isolation_depth(), 0);
    assert!(!global().is_set_up());
    assert_eq!(global().spec().tmp, before_tmp);
}

#[rstest]
#[serial]
fn capture_is_suppressed_while_isolated() {
    logsetup::testing::apply_test_defaults().expect("test defaults are valid");
    let captured = SharedBuffer::new();
    let capture: Arc<dyn LogHandler> = Arc::new(CaptureHandler::for_global(
        PercentFormatter::new("%(levelname)s %(message)s"),
        captured.clone(),
    ));
    global().add_handler(Arc::clone(&capture));

    {
        let _guard = IsolatedLogSetup::new().enter().expect("enter isolation");
        global().add_handler(Arc::clone(&capture));
        global().emit("tests", LogLevel::Warn, "inside isolation");
    }
    global().emit("tests", LogLevel::Warn, "outside isolation");
    global().remove_handler(&capture);

    assert_eq!(captured.contents(), "WARN outside isolation\n");
}

#[rstest]
#[serial]
fn override_spec_changes_defaults() {
    logsetup::testing::apply_test_defaults().expect("test defaults are valid");
    let original = global().default_spec().basename;
    global()
        .override_spec([("basename", "{appname}-{pid}.log")])
        .expect("valid override");
    global().reset();
    assert_eq!(global().spec().basename, "{appname}-{pid}.log");
    global()
        .override_spec([("basename", original.as_str())])
        .expect("restore basename");
}

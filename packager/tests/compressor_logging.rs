//! Log records emitted while locating the compressor.

use camino::Utf8Path;
use logtest::Logger;
use uepack_packager::tool::{SevenZip, locate_seven_zip};
use uepack_packager::test_utils::{ExpectedCall, StubExecutor};

#[test]
fn missing_configured_path_warns_and_probes() {
    let mut logger = Logger::start();
    let executor = StubExecutor::new(vec![ExpectedCall::new("7z", ["i"])]);

    let found = locate_seven_zip(Some(Utf8Path::new("/nonexistent/7z")), &executor);

    assert_eq!(found, Some(SevenZip::new("7z")));
    executor.assert_finished();

    let mut warned = false;
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn
            && record.args().to_string().contains("/nonexistent/7z does not exist")
        {
            warned = true;
            break;
        }
    }

    assert!(warned, "expected a warning about the configured 7-Zip path");
}

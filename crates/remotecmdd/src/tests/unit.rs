//! Unit tests for bootstrap and the one-shot local runner.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use remotecmd_protocol::{ArgumentNode, ProcessorArguments};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::commands::{DIRECTORY_CREATOR, FILE_LISTER};
use crate::{BootstrapError, LocalRunError, bootstrap_with, execute_local};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestConfigLoader,
};

#[fixture]
fn scratch() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn utf8(dir: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf8 temp path")
}

#[rstest]
fn bootstrap_reports_start_and_success() {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());

    bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(
        reporter.events(),
        vec![HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[rstest]
fn bootstrap_surfaces_configuration_errors() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&FailingConfigLoader, reporter.clone())
        .err()
        .expect("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}

#[rstest]
fn daemon_dispatcher_routes_through_the_reporter(scratch: TempDir) {
    let loader = TestConfigLoader::new();
    let reporter = Arc::new(RecordingHealthReporter::default());
    let daemon = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");
    let target = utf8(&scratch, "made");

    let arguments: ProcessorArguments =
        std::iter::once(ArgumentNode::leaf("directory", target.as_str())).collect();
    let result = daemon.dispatcher().dispatch(DIRECTORY_CREATOR, &arguments);

    assert!(result.is_success(), "dispatch failed: {:?}", result.reason());
    assert!(target.is_dir());
    assert!(reporter.events().contains(&HealthEvent::CommandCompleted {
        type_id: DIRECTORY_CREATOR.to_owned(),
        success: true,
    }));
}

#[rstest]
fn execute_local_runs_the_named_command(scratch: TempDir) {
    let target = utf8(&scratch, "nested/dir");
    let argument_file = utf8(&scratch, "args.json");
    fs::write(
        &argument_file,
        format!(r#"[{{"name":"directory","value":"{target}"}}]"#),
    )
    .expect("write argument file");
    let reporter = Arc::new(RecordingHealthReporter::default());

    let result = execute_local(
        &TestConfigLoader::new(),
        reporter.clone(),
        DIRECTORY_CREATOR,
        &argument_file,
    )
    .expect("local run");

    assert!(result.is_success(), "local run failed: {:?}", result.reason());
    assert!(target.is_dir());
    assert!(reporter.events().contains(&HealthEvent::CommandDispatched(
        DIRECTORY_CREATOR.to_owned()
    )));
}

#[rstest]
fn execute_local_reports_command_failures_as_results(scratch: TempDir) {
    let missing = utf8(&scratch, "absent");
    let argument_file = utf8(&scratch, "args.json");
    fs::write(
        &argument_file,
        format!(r#"[{{"name":"directory","value":"{missing}"}}]"#),
    )
    .expect("write argument file");

    let result = execute_local(
        &TestConfigLoader::new(),
        Arc::new(RecordingHealthReporter::default()),
        FILE_LISTER,
        &argument_file,
    )
    .expect("local run");

    assert!(!result.is_success());
    assert_eq!(
        result.reason(),
        Some(format!("directory {missing} does not exist").as_str())
    );
}

#[rstest]
fn execute_local_rejects_missing_argument_files(scratch: TempDir) {
    let error = execute_local(
        &TestConfigLoader::new(),
        Arc::new(RecordingHealthReporter::default()),
        DIRECTORY_CREATOR,
        &utf8(&scratch, "nope.json"),
    )
    .expect_err("missing file must fail");

    assert!(matches!(error, LocalRunError::ReadArguments { .. }));
}

#[rstest]
fn execute_local_rejects_malformed_argument_files(scratch: TempDir) {
    let argument_file = utf8(&scratch, "args.json");
    fs::write(&argument_file, "{\"name\":").expect("write argument file");

    let error = execute_local(
        &TestConfigLoader::new(),
        Arc::new(RecordingHealthReporter::default()),
        DIRECTORY_CREATOR,
        &argument_file,
    )
    .expect_err("malformed file must fail");

    assert!(matches!(error, LocalRunError::ParseArguments { .. }));
}

#[rstest]
fn execute_local_surfaces_configuration_errors(scratch: TempDir) {
    let argument_file = utf8(&scratch, "args.json");
    fs::write(&argument_file, "[]").expect("write argument file");

    let error = execute_local(
        &FailingConfigLoader,
        Arc::new(RecordingHealthReporter::default()),
        DIRECTORY_CREATOR,
        &argument_file,
    )
    .expect_err("configuration must fail");

    assert!(matches!(error, LocalRunError::Configuration(_)));
}

// tests/process_execution.rs

mod common;
use crate::common::builders::JobConfigBuilder;
use crate::common::{file_event, init_tracing, wait_until, with_timeout};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;

use dirwatch::exec::command::{exit_code, run_shell, spawn_captured};
use dirwatch::exec::decode::{decode_as, decode_output, UNPARSABLE_OUTPUT};
use dirwatch::exec::executor::split_command;
use dirwatch::exec::{spawn_supervisor, ChildTable, ExecError, ExecutorBackend, ProcessExecutor, StatusReporter};
use dirwatch::fs::mock::MockFileSystem;
use dirwatch::fs::{FileSystem, RealFileSystem};
use dirwatch::types::EventKind;
use dirwatch::watch::dispatch;

fn reporter(fs: Arc<dyn FileSystem>) -> Arc<StatusReporter> {
    Arc::new(StatusReporter::new(fs, "testhost"))
}

fn real_executor() -> ProcessExecutor {
    ProcessExecutor::new(ChildTable::new(), reporter(Arc::new(RealFileSystem)))
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

#[tokio::test]
async fn merged_output_and_exit_code_are_captured() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("echo out; echo err >&2; exit 3");
    let child = spawn_captured(cmd).expect("spawn");
    let (status, output) = with_timeout(child.wait_with_output()).await.expect("wait");

    assert_eq!(exit_code(status), 3);
    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("out\n"), "{text}");
    assert!(text.contains("err\n"), "{text}");
}

#[tokio::test]
async fn signal_killed_child_reports_negative_signal() {
    let (code, _) = with_timeout(run_shell("kill -9 $$")).await.expect("run");
    assert_eq!(code, -9);
}

#[test]
fn unbalanced_quotes_cannot_be_split() {
    assert!(matches!(split_command("echo 'oops"), Err(ExecError::Split { .. })));
    assert_eq!(
        split_command("cp 'a b' c").expect("split"),
        vec!["cp".to_string(), "a b".to_string(), "c".to_string()]
    );
}

#[tokio::test]
async fn empty_and_missing_programs_are_errors() {
    let job = JobConfigBuilder::new("/w", "true").compile("j");
    let executor = real_executor();

    assert!(matches!(executor.execute(&job, "   ").await, Err(ExecError::Empty)));
    assert!(matches!(
        executor.execute(&job, "/no/such/program-dirwatch").await,
        Err(ExecError::Spawn { .. })
    ));
}

#[tokio::test]
async fn create_event_runs_command_and_success_hook_only() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let ok = dir.path().join("ok");
    let failed = dir.path().join("failed");

    let job = JobConfigBuilder::new("/watch", "echo ${filename}")
        .on_success(&format!("printf %s ${{output}} > {}", ok.display()))
        .on_failure(&format!("touch {}", failed.display()))
        .compile("scan");

    let executor = real_executor();
    with_timeout(dispatch(&job, &file_event("/watch/a.txt", EventKind::Create), &executor)).await;

    assert_eq!(read(&ok), "/watch/a.txt\n");
    assert!(!failed.exists());
}

#[tokio::test]
async fn failing_command_runs_failure_hook_with_host_and_job() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let ok = dir.path().join("ok");
    let failed = dir.path().join("failed");

    let job = JobConfigBuilder::new("/watch", "sh -c 'exit 7'")
        .on_success(&format!("touch {}", ok.display()))
        .on_failure(&format!("echo ${{job}} ${{host}} > {}", failed.display()))
        .compile("scan");

    let executor = real_executor();
    with_timeout(executor.execute(&job, &job.command)).await.expect("execute");

    assert_eq!(read(&failed), "scan testhost\n");
    assert!(!ok.exists());
}

#[tokio::test]
async fn output_is_appended_to_outfile() {
    let fs = MockFileSystem::new();
    let job = JobConfigBuilder::new("/w", "echo hello")
        .outfile("/logs/${job}.out")
        .compile("greeter");

    let executor = ProcessExecutor::new(ChildTable::new(), reporter(Arc::new(fs.clone())));
    executor.execute(&job, &job.command).await.expect("first");
    executor.execute(&job, &job.command).await.expect("second");

    assert_eq!(fs.contents("/logs/greeter.out"), Some(b"hello\nhello\n".to_vec()));
}

#[tokio::test]
async fn output_reaches_a_real_outfile_in_order() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let job = JobConfigBuilder::new("/w", "echo ${tflags}")
        .outfile(&format!("{}/${{job}}.out", dir.path().display()))
        .compile("writer");

    let executor = real_executor();
    for kind in [EventKind::Create, EventKind::Delete] {
        with_timeout(dispatch(&job, &file_event("/w/a.txt", kind), &executor)).await;
    }

    assert_eq!(
        read(&dir.path().join("writer.out")),
        "IN_CREATE\nIN_DELETE\n"
    );
}

#[tokio::test]
async fn disabled_output_logging_writes_nothing() {
    let fs = MockFileSystem::new();
    let job = JobConfigBuilder::new("/w", "echo hello")
        .log_output(false)
        .outfile("/logs/${job}.out")
        .compile("quiet");

    let executor = ProcessExecutor::new(ChildTable::new(), reporter(Arc::new(fs.clone())));
    executor.execute(&job, &job.command).await.expect("execute");

    assert_eq!(fs.contents("/logs/quiet.out"), None);
}

#[tokio::test]
async fn background_child_is_tracked_then_reaped_by_supervisor() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let failed = dir.path().join("failed");

    let job = JobConfigBuilder::new("/w", "sh -c 'sleep 0.2; echo bye; exit 2'")
        .background(true)
        .on_failure(&format!("printf %s ${{output}} > {}", failed.display()))
        .compile("bg");

    let children = ChildTable::new();
    let report = reporter(Arc::new(RealFileSystem));
    let supervisor = spawn_supervisor(children.clone(), Arc::clone(&report), Duration::from_millis(20));
    let executor = ProcessExecutor::new(children.clone(), report);

    with_timeout(executor.execute(&job, &job.command)).await.expect("spawn");
    // The call returned before the child finished.
    assert_eq!(children.len(), 1);

    wait_until(|| children.is_empty() && failed.exists()).await;
    wait_until(|| read(&failed) == "bye\n").await;

    with_timeout(supervisor.shutdown()).await;
}

#[tokio::test]
async fn supervisor_shutdown_leaves_children_running() {
    let job = JobConfigBuilder::new("/w", "sleep 5").background(true).compile("long");

    let children = ChildTable::new();
    let report = reporter(Arc::new(RealFileSystem));
    let supervisor = spawn_supervisor(children.clone(), Arc::clone(&report), Duration::from_millis(20));
    let executor = ProcessExecutor::new(children.clone(), report);

    executor.execute(&job, &job.command).await.expect("spawn");
    tokio::time::sleep(Duration::from_millis(60)).await;
    with_timeout(supervisor.shutdown()).await;

    assert_eq!(children.len(), 1);
    let pid = children.pids()[0];
    assert!(children.contains(pid));
    assert!(dirwatch::daemon::process_alive(pid));
    let _ = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGKILL,
    );
}

#[test]
fn utf8_output_is_decoded() {
    assert_eq!(decode_output(b""), "");
    assert_eq!(decode_output(b"plain ascii\n"), "plain ascii\n");
    assert_eq!(decode_output("héllo wörld".as_bytes()), "héllo wörld");
}

#[test]
fn invalid_bytes_fall_back_to_detection_or_the_sentinel() {
    let bytes = b"caf\xe9 \xff\xfe";
    assert_eq!(decode_as(bytes, encoding_rs::UTF_8), UNPARSABLE_OUTPUT);
    assert_eq!(decode_as("ok".as_bytes(), encoding_rs::UTF_8), "ok");

    let detected = decode_output(bytes);
    assert_ne!(detected, UNPARSABLE_OUTPUT);
    assert!(detected.starts_with("caf"));
}

// tests/multiplexer_dispatch.rs

mod common;
use crate::common::builders::JobConfigBuilder;
use crate::common::{file_event, init_tracing, wait_until, with_timeout};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dirwatch::exec::ExecutorBackend;
use dirwatch::types::{EventKind, EventMask};
use dirwatch::watch::{dispatch, WatchMultiplexer};
use dirwatch_test_utils::fake_executor::FakeExecutor;
use dirwatch_test_utils::fake_source::{source_factory, FakeEventSource};

fn executor_handle(fake: &FakeExecutor) -> Arc<dyn ExecutorBackend> {
    Arc::new(fake.clone())
}

#[tokio::test]
async fn create_event_runs_rendered_command() {
    init_tracing();
    let job = JobConfigBuilder::new("/watch", "echo ${filename}").compile("scan");
    let (source, handle) = FakeEventSource::new();
    let fake = FakeExecutor::new();

    let mux = WatchMultiplexer::start(
        &[job],
        source_factory(HashMap::from([("scan".to_string(), source)])),
        executor_handle(&fake),
    );

    handle.send(file_event("/watch/a.txt", EventKind::Create));
    wait_until(|| fake.finished().len() == 1).await;

    assert_eq!(fake.commands_for("scan"), vec!["echo '/watch/a.txt'"]);
    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn registration_uses_job_settings_and_applies_exclusions() {
    init_tracing();
    let job = JobConfigBuilder::new("/watch", "true")
        .events(&["create", "delete"])
        .autoadd(false)
        .exclude_dir("/watch/cache")
        .compile("scan");
    let (source, handle) = FakeEventSource::with_subdirs(["/watch/cache", "/watch/docs"]);

    let mux = WatchMultiplexer::start(
        &[job],
        source_factory(HashMap::from([("scan".to_string(), source)])),
        executor_handle(&FakeExecutor::new()),
    );

    let log = handle.log();
    assert_eq!(
        log.registered,
        vec![(
            PathBuf::from("/watch"),
            EventMask::from(EventKind::Create) | EventKind::Delete,
            true,
            false
        )]
    );
    assert_eq!(log.removed, vec![PathBuf::from("/watch/cache")]);
    assert_eq!(log.watched, vec![PathBuf::from("/watch"), PathBuf::from("/watch/docs")]);

    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn excluded_extension_is_skipped_and_later_events_still_run() {
    init_tracing();
    let job = JobConfigBuilder::new("/watch", "echo ${filename}")
        .exclude_ext(".tmp")
        .compile("scan");
    let (source, handle) = FakeEventSource::new();
    let fake = FakeExecutor::new();

    let mux = WatchMultiplexer::start(
        &[job],
        source_factory(HashMap::from([("scan".to_string(), source)])),
        executor_handle(&fake),
    );

    handle.send(file_event("/watch/upload.tmp", EventKind::Create));
    handle.send(file_event("/watch/upload.txt", EventKind::Create));
    wait_until(|| !fake.finished().is_empty()).await;

    // Events of one job are handled in order, so the .tmp one was already
    // looked at and dropped.
    assert_eq!(fake.commands_for("scan"), vec!["echo '/watch/upload.txt'"]);
    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn blocked_job_does_not_stall_other_jobs() {
    init_tracing();
    let slow = JobConfigBuilder::new("/slow", "work ${filename}").compile("slow");
    let fast = JobConfigBuilder::new("/fast", "work ${filename}").compile("fast");
    let (slow_source, slow_handle) = FakeEventSource::new();
    let (fast_source, fast_handle) = FakeEventSource::new();

    let fake = FakeExecutor::new();
    fake.block_job("slow");

    let mux = WatchMultiplexer::start(
        &[slow, fast],
        source_factory(HashMap::from([
            ("slow".to_string(), slow_source),
            ("fast".to_string(), fast_source),
        ])),
        executor_handle(&fake),
    );

    slow_handle.send(file_event("/slow/1", EventKind::Create));
    wait_until(|| fake.started().len() == 1).await;

    fast_handle.send(file_event("/fast/1", EventKind::Create));
    fast_handle.send(file_event("/fast/2", EventKind::Create));
    wait_until(|| fake.commands_for("fast").len() == 2).await;
    assert!(fake.commands_for("slow").is_empty());

    fake.release("slow");
    wait_until(|| fake.commands_for("slow").len() == 1).await;
    assert_eq!(fake.commands_for("slow"), vec!["work '/slow/1'"]);

    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn events_of_one_job_are_handled_in_order() {
    init_tracing();
    let job = JobConfigBuilder::new("/watch", "echo ${filename}").compile("scan");
    let (source, handle) = FakeEventSource::new();
    let fake = FakeExecutor::new();

    let mux = WatchMultiplexer::start(
        &[job],
        source_factory(HashMap::from([("scan".to_string(), source)])),
        executor_handle(&fake),
    );

    for i in 0..5 {
        handle.send(file_event(format!("/watch/{i}"), EventKind::Create));
    }
    wait_until(|| fake.finished().len() == 5).await;

    let expected: Vec<String> = (0..5).map(|i| format!("echo '/watch/{i}'")).collect();
    assert_eq!(fake.commands_for("scan"), expected);
    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn job_failing_to_register_is_skipped() {
    init_tracing();
    let good = JobConfigBuilder::new("/good", "echo ${filename}").compile("good");
    let bad = JobConfigBuilder::new("/bad", "echo ${filename}").compile("bad");
    let missing = JobConfigBuilder::new("/missing", "true").compile("missing");

    let (good_source, good_handle) = FakeEventSource::new();
    let (bad_source, bad_handle) = FakeEventSource::failing();
    let fake = FakeExecutor::new();

    let mux = WatchMultiplexer::start(
        &[bad, good, missing],
        source_factory(HashMap::from([
            ("good".to_string(), good_source),
            ("bad".to_string(), bad_source),
        ])),
        executor_handle(&fake),
    );

    assert_eq!(mux.job_names(), vec!["good"]);
    assert_eq!(bad_handle.log().registered.len(), 1);
    // The failed source was dropped.
    assert!(bad_handle.is_closed());

    good_handle.send(file_event("/good/x", EventKind::Create));
    wait_until(|| fake.finished().len() == 1).await;
    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn template_error_skips_only_that_event() {
    init_tracing();
    let broken = JobConfigBuilder::new("/broken", "echo ${nonsense}").compile("broken");
    let fine = JobConfigBuilder::new("/fine", "echo ${filename}").compile("fine");
    let (broken_source, broken_handle) = FakeEventSource::new();
    let (fine_source, fine_handle) = FakeEventSource::new();
    let fake = FakeExecutor::new();

    let mux = WatchMultiplexer::start(
        &[broken, fine],
        source_factory(HashMap::from([
            ("broken".to_string(), broken_source),
            ("fine".to_string(), fine_source),
        ])),
        executor_handle(&fake),
    );

    broken_handle.send(file_event("/broken/a", EventKind::Create));
    fine_handle.send(file_event("/fine/a", EventKind::Create));
    wait_until(|| fake.finished().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(fake.started(), vec![("fine".to_string(), "echo '/fine/a'".to_string())]);
    with_timeout(mux.shutdown()).await;
}

#[tokio::test]
async fn shutdown_drops_every_source() {
    init_tracing();
    let a = JobConfigBuilder::new("/a", "true").compile("a");
    let b = JobConfigBuilder::new("/b", "true").compile("b");
    let (a_source, a_handle) = FakeEventSource::new();
    let (b_source, b_handle) = FakeEventSource::new();

    let mux = WatchMultiplexer::start(
        &[a, b],
        source_factory(HashMap::from([
            ("a".to_string(), a_source),
            ("b".to_string(), b_source),
        ])),
        executor_handle(&FakeExecutor::new()),
    );
    assert_eq!(mux.len(), 2);
    assert!(!a_handle.is_closed());

    with_timeout(mux.shutdown()).await;
    assert!(a_handle.is_closed());
    assert!(b_handle.is_closed());
}

#[tokio::test]
async fn dispatch_can_be_called_directly() {
    let job = JobConfigBuilder::new("/watch", "mv ${filename} /done")
        .include_ext(".csv")
        .compile("mover");
    let fake = FakeExecutor::new();

    dispatch(&job, &file_event("/watch/report.csv", EventKind::MovedTo), &fake).await;
    dispatch(&job, &file_event("/watch/report.xls", EventKind::MovedTo), &fake).await;

    assert_eq!(fake.commands_for("mover"), vec!["mv '/watch/report.csv' /done"]);
}

// tests/engine_run.rs

mod common;
use crate::common::builders::JobConfigBuilder;
use crate::common::{file_event, init_tracing, wait_until, with_timeout};

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::oneshot;

use dirwatch::engine::Engine;
use dirwatch::fs::RealFileSystem;
use dirwatch::types::EventKind;
use dirwatch_test_utils::fake_source::{source_factory, FakeEventSource};

#[tokio::test]
async fn engine_runs_commands_until_shutdown() {
    init_tracing();
    let dir = TempDir::new().expect("tempdir");
    let marker = dir.path().join("touched");

    let job = JobConfigBuilder::new(dir.path(), "touch ${filename}").compile("toucher");
    let engine = Engine::new(vec![job], Arc::new(RealFileSystem));
    assert_eq!(engine.jobs().len(), 1);

    let (source, handle) = FakeEventSource::new();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = async {
        handle.send(file_event(&marker, EventKind::Create));
        wait_until(|| marker.exists()).await;
        stop_tx.send(()).expect("engine still running");
    };
    let run = engine.run_until(
        source_factory(HashMap::from([("toucher".to_string(), source)])),
        async {
            let _ = stop_rx.await;
        },
    );

    with_timeout(async { tokio::join!(run, driver) }).await;

    assert!(marker.exists());
    assert!(handle.is_closed());
}

#[tokio::test]
async fn engine_without_startable_jobs_still_waits_for_shutdown() {
    init_tracing();
    let job = JobConfigBuilder::new("/nowhere", "true").compile("orphan");
    let engine = Engine::new(vec![job], Arc::new(RealFileSystem));

    // No prepared source: every job fails to register.
    with_timeout(engine.run_until(
        source_factory(HashMap::new()),
        tokio::time::sleep(std::time::Duration::from_millis(50)),
    ))
    .await;
}

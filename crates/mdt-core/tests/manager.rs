//! Integration test: registry queries, trimming and waiting for idle.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fakes::{backends, Gate, RecordingTranscode, ScriptedDownload};
use mdt_core::backend::{Backends, DownloadStatus, ProgressReport};
use mdt_core::{JobManager, JobSpec, Stage};
use tempfile::{tempdir, TempDir};

const WAIT: Duration = Duration::from_secs(5);

/// A manager whose jobs block in download until `gate` opens.
fn gated_manager(dir: &TempDir, gate: &Gate) -> JobManager {
    let intermediate = dir.path().join("held.webm");
    std::fs::write(&intermediate, b"raw").unwrap();
    let download = ScriptedDownload::gated(
        vec![ProgressReport::new(DownloadStatus::Finished).with_filename(intermediate)],
        gate,
    );
    JobManager::new(backends(download, &Arc::new(RecordingTranscode::default())))
}

fn failing_backends() -> Backends {
    backends(
        ScriptedDownload::failing(Vec::new()),
        &Arc::new(RecordingTranscode::default()),
    )
}

#[tokio::test]
async fn running_jobs_excludes_finished_and_trim_removes_them() {
    let dir = tempdir().unwrap();
    let gate = Gate::default();
    let mut held = gated_manager(&dir, &gate);
    held.add(JobSpec::new("held", dir.path().join("held.mp3")));

    // A failing job in a second registry gives us an errored job to compare against.
    let mut failing = JobManager::new(failing_backends());
    let stage = tokio::time::timeout(WAIT, failing.add(JobSpec::new("bad", "bad.mp3")).finished())
        .await
        .unwrap();
    assert_eq!(stage, Stage::Error);
    assert!(failing.running_jobs().is_empty());
    assert_eq!(failing.trim().len(), 1);
    assert!(failing.is_empty());

    assert_eq!(held.running_jobs().len(), 1);
    assert!(held.trim().is_empty(), "running jobs are never trimmed");
    assert_eq!(held.len(), 1);

    gate.open();
    let stage = tokio::time::timeout(WAIT, held.jobs()[0].finished()).await.unwrap();
    assert_eq!(stage, Stage::Done);
    assert!(held.running_jobs().is_empty());
    let removed = held.trim();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].stage(), Stage::Done);
    assert!(held.is_empty());
}

#[tokio::test]
async fn display_order_is_insertion_order() {
    let mut manager = JobManager::new(failing_backends());
    for name in ["first.mp3", "second.mp3", "third.mp3"] {
        manager.add(JobSpec::new("src", name));
    }
    let names: Vec<String> = manager.jobs().iter().map(|j| j.name()).collect();
    assert_eq!(names, ["first.mp3", "second.mp3", "third.mp3"]);
}

#[tokio::test]
async fn wait_until_idle_blocks_while_jobs_run() {
    let dir = tempdir().unwrap();
    let gate = Gate::default();
    let mut manager = gated_manager(&dir, &gate);
    manager.add(JobSpec::new("held", dir.path().join("held.mp3")));

    let mut seen = Vec::new();
    let still_waiting = tokio::time::timeout(
        Duration::from_millis(150),
        manager.wait_until_idle(Duration::from_millis(10), |n| seen.push(n)),
    )
    .await;
    assert!(still_waiting.is_err(), "must not return while a job runs");
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|n| *n == 1));

    gate.open();
    tokio::time::timeout(WAIT, manager.wait_until_idle(Duration::from_millis(10), |_| {}))
        .await
        .expect("returns once no job is running");
    assert!(manager.running_jobs().is_empty());
}

#[tokio::test]
async fn wait_until_idle_returns_immediately_when_empty() {
    let manager = JobManager::new(failing_backends());
    let mut calls = 0;
    manager
        .wait_until_idle(Duration::from_secs(60), |_| calls += 1)
        .await;
    assert_eq!(calls, 0);
}

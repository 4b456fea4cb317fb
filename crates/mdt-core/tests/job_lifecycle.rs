//! Integration test: job workers driven by fake backends.
//!
//! Each test spawns a real job (its own worker thread) and waits for it to
//! reach a terminal stage, then checks what the backends saw.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::fakes::{backends, RecordingTranscode, ScriptedDownload};
use mdt_core::backend::{DownloadStatus, ProgressReport};
use mdt_core::{Job, JobSpec, Stage};
use tempfile::tempdir;

const WAIT: Duration = Duration::from_secs(5);

async fn run_to_end(job: &Job) -> Stage {
    tokio::time::timeout(WAIT, job.finished())
        .await
        .expect("job should finish")
}

fn spec(destination: PathBuf) -> JobSpec {
    JobSpec {
        input_options: vec!["-ss".into(), "0:05".into()],
        output_options: vec!["-metadata".into(), "title=Song".into()],
        format: "bestaudio/best".into(),
        ..JobSpec::new("https://example.com/watch?v=1", destination)
    }
}

#[tokio::test]
async fn successful_job_reaches_done_and_removes_intermediate() {
    let dir = tempdir().unwrap();
    let intermediate = dir.path().join("song.webm");
    std::fs::write(&intermediate, b"raw").unwrap();
    let destination = dir.path().join("Song.mp3");

    let transcode = Arc::new(RecordingTranscode::default());
    let download = ScriptedDownload::new(vec![
        ProgressReport::bytes(50, 100).with_filename(&intermediate),
        ProgressReport::bytes(80, 100),
        ProgressReport::new(DownloadStatus::Finished).with_filename(&intermediate),
    ]);
    let job = Job::spawn(spec(destination.clone()), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Done);
    let snapshot = job.snapshot();
    assert_eq!(snapshot.progress.current_progress(), 1.0);
    assert_eq!(snapshot.intermediate.as_deref(), Some(intermediate.as_path()));
    assert!(!intermediate.exists(), "intermediate file should be removed");
    assert!(destination.exists(), "destination should be written");

    let calls = transcode.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].input, intermediate);
    assert_eq!(calls[0].destination, destination);
    assert_eq!(calls[0].input_options, vec!["-ss", "0:05"]);
    assert_eq!(calls[0].output_options, vec!["-metadata", "title=Song"]);
}

#[tokio::test]
async fn download_failure_never_reaches_post_process() {
    let dir = tempdir().unwrap();
    let transcode = Arc::new(RecordingTranscode::default());
    let download = ScriptedDownload::failing(vec![
        ProgressReport::bytes(10, 100).with_filename(dir.path().join("x.webm")),
    ]);
    let job = Job::spawn(spec(dir.path().join("x.mp3")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Error);
    assert!(transcode.calls().is_empty(), "transcode must not run");
    assert!(!job.is_running());
}

#[tokio::test]
async fn reported_error_stops_the_download() {
    let dir = tempdir().unwrap();
    let transcode = Arc::new(RecordingTranscode::default());
    let download = ScriptedDownload::new(vec![
        ProgressReport::bytes(20, 100).with_filename(dir.path().join("x.webm")),
        ProgressReport::new(DownloadStatus::Error),
        ProgressReport::bytes(90, 100),
    ]);
    let job = Job::spawn(spec(dir.path().join("x.mp3")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Error);
    assert!(transcode.calls().is_empty());
    assert!(
        job.snapshot().progress.current_progress() < 0.9,
        "reports after the error must not be consumed"
    );
}

#[tokio::test]
async fn download_without_file_path_is_an_error() {
    let dir = tempdir().unwrap();
    let transcode = Arc::new(RecordingTranscode::default());
    let download = ScriptedDownload::new(vec![
        ProgressReport::bytes(100, 100),
        ProgressReport::new(DownloadStatus::Finished),
    ]);
    let job = Job::spawn(spec(dir.path().join("x.mp3")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Error);
    assert!(transcode.calls().is_empty());
}

#[tokio::test]
async fn transcode_failure_keeps_intermediate() {
    let dir = tempdir().unwrap();
    let intermediate = dir.path().join("clip.webm");
    std::fs::write(&intermediate, b"raw").unwrap();

    let transcode = Arc::new(RecordingTranscode {
        fail: true,
        ..RecordingTranscode::default()
    });
    let download = ScriptedDownload::new(vec![
        ProgressReport::new(DownloadStatus::Finished).with_filename(&intermediate),
    ]);
    let job = Job::spawn(spec(dir.path().join("clip.mp4")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Error);
    assert_eq!(transcode.calls().len(), 1);
    assert!(intermediate.exists());
}

#[tokio::test]
async fn backend_panic_marks_job_errored() {
    let dir = tempdir().unwrap();
    let transcode = Arc::new(RecordingTranscode::default());
    let download = ScriptedDownload {
        panic: true,
        ..ScriptedDownload::new(vec![
            ProgressReport::bytes(1, 2).with_filename(dir.path().join("p.webm")),
        ])
    };
    let job = Job::spawn(spec(dir.path().join("p.mp3")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Error);
    assert!(transcode.calls().is_empty());
}

#[tokio::test]
async fn partial_reports_are_ignored_and_finished_forces_full_progress() {
    let dir = tempdir().unwrap();
    let intermediate = dir.path().join("part.webm");
    std::fs::write(&intermediate, b"raw").unwrap();

    let transcode = Arc::new(RecordingTranscode::default());
    let only_downloaded = ProgressReport {
        downloaded_bytes: Some(40),
        ..ProgressReport::new(DownloadStatus::InProgress)
    };
    let only_total = ProgressReport {
        total_bytes: Some(100),
        ..ProgressReport::new(DownloadStatus::InProgress)
    };
    let download = ScriptedDownload::new(vec![
        only_downloaded.with_filename(&intermediate),
        only_total,
        ProgressReport::bytes(30, 100),
        ProgressReport::new(DownloadStatus::Finished),
    ]);
    let job = Job::spawn(spec(dir.path().join("part.mp3")), &backends(download, &transcode));

    assert_eq!(run_to_end(&job).await, Stage::Done);
    let progress = job.snapshot().progress;
    assert_eq!(progress.current_progress(), 1.0);
    assert!(progress.assumed_rate().is_some());
    assert!(progress.estimated_completion_time().unwrap() >= progress.last_update());
}

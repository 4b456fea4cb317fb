//! Worker thread: download, then transcode, then clean up.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use super::{JobSnapshot, JobSpec, Stage};
use crate::backend::{BackendError, Backends, DownloadStatus, ProgressReport, TranscodeRequest};
use crate::progress::ProgressTracker;

/// Start the worker for one job on its own OS thread.
pub(super) fn start(spec: Arc<JobSpec>, backends: Backends, tx: watch::Sender<JobSnapshot>) {
    let state = Publisher {
        tx,
        job: spec.destination.display().to_string(),
    };
    let name = thread_name(&spec.destination);
    let worker = Worker { spec, backends };
    // On spawn failure the closure is dropped, and with it the publisher,
    // whose guard marks the job as errored.
    let spawned = std::thread::Builder::new()
        .name(name)
        .spawn(move || worker.run(&state));
    if let Err(e) = spawned {
        tracing::error!("could not start job worker: {}", e);
    }
}

/// `mdt-job:<file name>`, so log lines of concurrent jobs can be told apart.
fn thread_name(destination: &Path) -> String {
    let file = destination
        .file_name()
        .unwrap_or(destination.as_os_str())
        .to_string_lossy();
    let file: String = file.chars().filter(|c| *c != '\0').collect();
    format!("mdt-job:{}", file)
}

/// Single writer of a job's snapshot.
///
/// Dropping it while the job is still active (early return, panic in a
/// backend, failed spawn) publishes `error`, so no reader waits forever on a
/// worker that is gone.
struct Publisher {
    tx: watch::Sender<JobSnapshot>,
    job: String,
}

impl Publisher {
    fn stage(&self) -> Stage {
        self.tx.borrow().stage
    }

    fn progress(&self) -> ProgressTracker {
        self.tx.borrow().progress
    }

    /// Move to `next` if the lifecycle allows it. Returns whether it moved.
    fn advance(&self, next: Stage) -> bool {
        let mut from = None;
        let moved = self.tx.send_if_modified(|s| {
            if !s.stage.can_advance_to(next) {
                return false;
            }
            from = Some(s.stage);
            s.stage = next;
            true
        });
        if let Some(from) = from {
            tracing::info!(job = %self.job, %from, to = %next, "stage changed");
        }
        moved
    }

    fn publish_progress(&self, tracker: ProgressTracker) {
        self.tx.send_modify(|s| s.progress = tracker);
    }

    fn publish_intermediate(&self, path: &Path) {
        self.tx.send_if_modified(|s| {
            if s.intermediate.as_deref() == Some(path) {
                return false;
            }
            s.intermediate = Some(path.to_path_buf());
            true
        });
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if !self.stage().is_terminal() {
            tracing::error!(job = %self.job, stage = %self.stage(), "worker stopped before finishing");
            self.advance(Stage::Error);
        }
    }
}

struct Worker {
    spec: Arc<JobSpec>,
    backends: Backends,
}

impl Worker {
    fn run(self, state: &Publisher) {
        tracing::info!(job = %state.job, source = %self.spec.source, "job started");
        let outcome = self
            .download(state)
            .and_then(|input| self.post_process(state, &input));
        match outcome {
            Ok(()) => tracing::info!(job = %state.job, "job done"),
            Err(err) => {
                tracing::warn!(job = %state.job, stage = %state.stage(), "job failed: {}", err);
                state.advance(Stage::Error);
            }
        }
    }

    /// Run the download backend. Returns the intermediate file on success and
    /// leaves the job in `post-process`.
    fn download(&self, state: &Publisher) -> Result<PathBuf, BackendError> {
        let mut tracker = state.progress();
        let mut intermediate: Option<PathBuf> = None;
        let mut reported_error = false;

        let result = self.backends.download.download(
            &self.spec.source,
            &self.spec.format,
            &mut |report: ProgressReport| {
                if report.status == DownloadStatus::Error {
                    reported_error = true;
                    state.advance(Stage::Error);
                    return ControlFlow::Break(());
                }
                if let Some(path) = &report.filename {
                    state.publish_intermediate(path);
                    intermediate = Some(path.clone());
                }
                let sample = match report.status {
                    DownloadStatus::Finished => Some(1.0),
                    _ => report.fraction(),
                };
                if let Some(fraction) = sample {
                    if tracker.update(fraction) {
                        state.publish_progress(tracker);
                    }
                }
                ControlFlow::Continue(())
            },
        );

        if reported_error {
            return Err(BackendError::Reported);
        }
        result?;
        let input = intermediate.ok_or(BackendError::MissingIntermediate)?;
        state.advance(Stage::PostProcess);
        Ok(input)
    }

    /// Transcode the intermediate file into the destination, then remove it.
    fn post_process(&self, state: &Publisher, input: &Path) -> Result<(), BackendError> {
        let request = TranscodeRequest {
            input_options: self.spec.input_options.clone(),
            input: input.to_path_buf(),
            output_options: self.spec.output_options.clone(),
            destination: self.spec.destination.clone(),
        };
        self.backends.transcode.transcode(&request)?;
        state.advance(Stage::Done);

        if input != self.spec.destination {
            if let Err(e) = std::fs::remove_file(input) {
                tracing::warn!(job = %state.job, path = %input.display(), "could not remove intermediate file: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> (Publisher, watch::Receiver<JobSnapshot>) {
        let (tx, rx) = watch::channel(JobSnapshot::initial());
        let p = Publisher {
            tx,
            job: "test.mp3".to_string(),
        };
        (p, rx)
    }

    #[test]
    fn thread_name_carries_destination_file() {
        assert_eq!(thread_name(Path::new("music/Song Title.mp3")), "mdt-job:Song Title.mp3");
        assert_eq!(thread_name(Path::new("clip.mp4")), "mdt-job:clip.mp4");
        assert_eq!(thread_name(Path::new("a\0b.mp3")), "mdt-job:ab.mp3");
    }

    #[test]
    fn advance_follows_lifecycle() {
        let (p, rx) = publisher();
        assert!(p.advance(Stage::PostProcess));
        assert!(!p.advance(Stage::Download));
        assert_eq!(rx.borrow().stage, Stage::PostProcess);
        assert!(p.advance(Stage::Done));
        assert!(!p.advance(Stage::Error));
        assert_eq!(rx.borrow().stage, Stage::Done);
    }

    #[test]
    fn dropping_active_publisher_marks_error() {
        let (p, rx) = publisher();
        p.advance(Stage::PostProcess);
        drop(p);
        assert_eq!(rx.borrow().stage, Stage::Error);
    }

    #[test]
    fn dropping_finished_publisher_keeps_done() {
        let (p, rx) = publisher();
        p.advance(Stage::PostProcess);
        p.advance(Stage::Done);
        drop(p);
        assert_eq!(rx.borrow().stage, Stage::Done);
    }

    #[test]
    fn intermediate_path_last_value_wins() {
        let (p, rx) = publisher();
        p.publish_intermediate(Path::new("a.part"));
        p.publish_intermediate(Path::new("a.webm"));
        assert_eq!(rx.borrow().intermediate.as_deref(), Some(Path::new("a.webm")));
        p.advance(Stage::Error);
    }
}

//! A download-and-transcode job and its lifecycle.
//!
//! Each job owns exactly one worker thread that walks
//! `download → post-process → done`, or ends in `error`. The worker is the
//! only writer of the job's state; it publishes a [`JobSnapshot`] through a
//! watch channel so the shell can read progress without ever blocking it.

mod worker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::Backends;
use crate::progress::ProgressTracker;

/// Lifecycle stage of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Download,
    PostProcess,
    Done,
    Error,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::PostProcess => "post-process",
            Stage::Done => "done",
            Stage::Error => "error",
        }
    }

    /// `done` and `error` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Error)
    }

    fn rank(self) -> u8 {
        match self {
            Stage::Download => 0,
            Stage::PostProcess => 1,
            Stage::Done => 2,
            Stage::Error => 3,
        }
    }

    /// Whether a job in `self` may move to `next`: strictly forward along the
    /// pipeline, or into `error` from any non-terminal stage.
    pub fn can_advance_to(self, next: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Stage::Error || next.rank() > self.rank()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed parameters of a job, resolved before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Opaque source handle (usually a URL) for the download backend.
    pub source: String,
    /// Final output file; also the job's display name.
    pub destination: PathBuf,
    /// Download backend format selector.
    pub format: String,
    /// Transcode flags placed before the input file.
    pub input_options: Vec<String>,
    /// Transcode flags placed after the input file.
    pub output_options: Vec<String>,
}

impl JobSpec {
    pub fn new(source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            format: "best".to_string(),
            input_options: Vec::new(),
            output_options: Vec::new(),
        }
    }
}

/// Point-in-time view of a job's mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub stage: Stage,
    pub progress: ProgressTracker,
    /// Downloaded file awaiting transcode, once the backend has reported it.
    pub intermediate: Option<PathBuf>,
}

impl JobSnapshot {
    fn initial() -> Self {
        Self {
            stage: Stage::Download,
            progress: ProgressTracker::new(),
            intermediate: None,
        }
    }
}

/// Handle to a running (or finished) job.
pub struct Job {
    spec: Arc<JobSpec>,
    state: watch::Receiver<JobSnapshot>,
}

impl Job {
    /// Create the job and start its worker immediately.
    pub fn spawn(spec: JobSpec, backends: &Backends) -> Job {
        let spec = Arc::new(spec);
        let (tx, rx) = watch::channel(JobSnapshot::initial());
        worker::start(Arc::clone(&spec), backends.clone(), tx);
        Job { spec, state: rx }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn source(&self) -> &str {
        &self.spec.source
    }

    pub fn destination(&self) -> &Path {
        &self.spec.destination
    }

    /// Display name (the destination path).
    pub fn name(&self) -> String {
        self.spec.destination.display().to_string()
    }

    pub fn stage(&self) -> Stage {
        self.state.borrow().stage
    }

    /// True while the job is neither done nor errored.
    pub fn is_running(&self) -> bool {
        !self.stage().is_terminal()
    }

    /// Copy of the latest published state. May be slightly stale.
    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    /// Resolves once the job reaches a terminal stage and returns it.
    pub async fn finished(&self) -> Stage {
        let mut rx = self.state.clone();
        let stage = match rx.wait_for(|s| s.stage.is_terminal()).await {
            Ok(snapshot) => snapshot.stage,
            // Worker gone; its drop guard has already published a terminal stage.
            Err(_) => self.stage(),
        };
        stage
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("source", &self.spec.source)
            .field("destination", &self.spec.destination)
            .field("stage", &self.stage())
            .finish()
    }
}

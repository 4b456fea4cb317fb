//! Registry of jobs owned by the shell.
//!
//! Only the foreground mutates the registry (add/trim); workers never touch
//! it, so it needs no synchronization. Insertion order is display order.

use std::time::Duration;

use crate::backend::Backends;
use crate::job::{Job, JobSpec};

pub struct JobManager {
    jobs: Vec<Job>,
    backends: Backends,
}

impl JobManager {
    pub fn new(backends: Backends) -> Self {
        Self {
            jobs: Vec::new(),
            backends,
        }
    }

    /// Create a job, start its worker and append it to the registry.
    pub fn add(&mut self, spec: JobSpec) -> &Job {
        tracing::info!(source = %spec.source, destination = %spec.destination.display(), "adding job");
        let index = self.jobs.len();
        self.jobs.push(Job::spawn(spec, &self.backends));
        &self.jobs[index]
    }

    /// All jobs, in insertion order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs whose stage is neither `done` nor `error`.
    pub fn running_jobs(&self) -> Vec<&Job> {
        self.jobs.iter().filter(|j| j.is_running()).collect()
    }

    pub fn running_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_running()).count()
    }

    /// Drop every finished or errored job from the registry and return them.
    pub fn trim(&mut self) -> Vec<Job> {
        let (running, finished): (Vec<Job>, Vec<Job>) =
            std::mem::take(&mut self.jobs).into_iter().partition(Job::is_running);
        self.jobs = running;
        if !finished.is_empty() {
            tracing::debug!(removed = finished.len(), kept = self.jobs.len(), "trimmed jobs");
        }
        finished
    }

    /// Poll every `interval` until no job is running. `on_wait` is called with
    /// the number of running jobs before each sleep. Never cancels a worker.
    pub async fn wait_until_idle(&self, interval: Duration, mut on_wait: impl FnMut(usize)) {
        loop {
            let running = self.running_count();
            if running == 0 {
                return;
            }
            on_wait(running);
            tokio::time::sleep(interval).await;
        }
    }
}

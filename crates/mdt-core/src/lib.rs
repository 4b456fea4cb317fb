pub mod config;
pub mod logging;

pub mod backend;
pub mod job;
pub mod manager;
pub mod options;
pub mod progress;
pub mod router;

pub use job::{Job, JobSnapshot, JobSpec, Stage};
pub use manager::JobManager;
pub use progress::ProgressTracker;
pub use router::{CommandRouter, Flow};

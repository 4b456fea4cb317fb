//! External backends a job drives: media download, transcode, metadata probe.
//!
//! The job state machine only depends on the traits here. The concrete
//! adapters run `yt-dlp` and `ffmpeg` as subprocesses.

mod error;
mod ffmpeg;
mod process;
mod ytdlp;

pub use error::BackendError;
pub use ffmpeg::Ffmpeg;
pub use ytdlp::{parse_progress_line, YtDlp};

use serde::Deserialize;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

/// Status tag of a download progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    InProgress,
    Finished,
    Error,
}

/// One progress callback from the download backend. Every field but the
/// status is optional; partial reports are normal around transfer start/end.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub status: DownloadStatus,
    /// Local path of the file being fetched.
    pub filename: Option<PathBuf>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<f64>,
}

impl ProgressReport {
    pub fn new(status: DownloadStatus) -> Self {
        Self {
            status,
            filename: None,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
        }
    }

    /// In-progress report with byte counts.
    pub fn bytes(downloaded: u64, total: u64) -> Self {
        Self {
            downloaded_bytes: Some(downloaded),
            total_bytes: Some(total),
            ..Self::new(DownloadStatus::InProgress)
        }
    }

    pub fn with_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = Some(path.into());
        self
    }

    /// Downloaded / total, falling back to the total estimate. `None` when
    /// either side is missing; a zero total counts as missing.
    pub fn fraction(&self) -> Option<f64> {
        let downloaded = self.downloaded_bytes? as f64;
        let total = self
            .total_bytes
            .filter(|t| *t > 0)
            .map(|t| t as f64)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0))?;
        Some(downloaded / total)
    }
}

/// Progress callback handed to [`DownloadBackend::download`]. Returning
/// `Break` asks the backend to stop the transfer.
pub type ProgressFn<'a> = dyn FnMut(ProgressReport) -> ControlFlow<()> + 'a;

/// Fetches a source to a local file, reporting progress along the way.
pub trait DownloadBackend: Send + Sync {
    fn download(
        &self,
        source: &str,
        format: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<(), BackendError>;
}

/// Everything the transcode step needs; option order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub input_options: Vec<String>,
    pub input: PathBuf,
    pub output_options: Vec<String>,
    pub destination: PathBuf,
}

/// Converts the intermediate file into the destination. Blocks until done.
pub trait TranscodeBackend: Send + Sync {
    fn transcode(&self, request: &TranscodeRequest) -> Result<(), BackendError>;
}

/// Media metadata used to suggest a destination and tag the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub alt_title: Option<String>,
    pub creator: Option<String>,
    pub track: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub release_year: Option<i64>,
    pub genre: Option<String>,
    pub categories: Option<Vec<String>>,
}

/// Looks up metadata for a source before a job is created.
pub trait MetadataProbe: Send + Sync {
    fn probe(&self, source: &str) -> Result<MediaInfo, BackendError>;
}

/// The pair of backends every job worker uses.
#[derive(Clone)]
pub struct Backends {
    pub download: Arc<dyn DownloadBackend>,
    pub transcode: Arc<dyn TranscodeBackend>,
}

impl Backends {
    pub fn new(download: Arc<dyn DownloadBackend>, transcode: Arc<dyn TranscodeBackend>) -> Self {
        Self {
            download,
            transcode,
        }
    }
}

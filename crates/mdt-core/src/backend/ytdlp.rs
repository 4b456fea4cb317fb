//! yt-dlp adapter: downloads with structured progress, and metadata probing.
//!
//! Progress is read from stdout. yt-dlp is asked to print every progress
//! update as one JSON object behind [`PROGRESS_MARKER`], and the final file
//! path behind [`FILE_MARKER`] once the file is in place.

use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::process::{self, StderrTail};
use super::{
    BackendError, DownloadBackend, DownloadStatus, MediaInfo, MetadataProbe, ProgressFn,
    ProgressReport,
};
use crate::config::MdtConfig;

const PROGRESS_MARKER: &str = "[mdt-progress]";
const FILE_MARKER: &str = "[mdt-file]";

/// yt-dlp backed download and metadata probe.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: String,
    output_template: String,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>, output_template: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            output_template: output_template.into(),
        }
    }

    pub fn from_config(cfg: &MdtConfig) -> Self {
        Self::new(cfg.ytdlp_bin.clone(), cfg.output_template.clone())
    }

    fn download_args(&self, source: &str, format: &str) -> Vec<String> {
        vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!("download:{}%(progress)j", PROGRESS_MARKER),
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", FILE_MARKER),
            "-f".to_string(),
            format.to_string(),
            "-o".to_string(),
            self.output_template.clone(),
            "--".to_string(),
            source.to_string(),
        ]
    }
}

impl DownloadBackend for YtDlp {
    fn download(
        &self,
        source: &str,
        format: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(self.download_args(source, format))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = process::spawn(&self.bin, &mut cmd)?;
        let stderr = StderrTail::capture(&self.bin, child.stderr.take());

        let Some(stdout) = child.stdout.take() else {
            process::kill(&mut child);
            return Err(BackendError::Malformed {
                program: self.bin.clone(),
                detail: "stdout not captured".to_string(),
            });
        };

        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    process::kill(&mut child);
                    return Err(e.into());
                }
            };
            let Some(report) = parse_progress_line(&line) else {
                tracing::trace!(source, "yt-dlp: {}", line);
                continue;
            };
            if on_progress(report).is_break() {
                tracing::debug!(source, "progress callback asked to stop; killing yt-dlp");
                process::kill(&mut child);
                return Err(BackendError::Stopped);
            }
        }

        let status = child.wait()?;
        process::check_exit(&self.bin, status, stderr.finish())
    }
}

impl MetadataProbe for YtDlp {
    fn probe(&self, source: &str) -> Result<MediaInfo, BackendError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["--dump-json", "--no-playlist", "--", source])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let child = process::spawn(&self.bin, &mut cmd)?;
        let output = child.wait_with_output()?;
        process::check_exit(
            &self.bin,
            output.status,
            String::from_utf8_lossy(&output.stderr).into_owned(),
        )?;
        serde_json::from_slice(&output.stdout).map_err(|e| BackendError::Malformed {
            program: self.bin.clone(),
            detail: format!("metadata json: {}", e),
        })
    }
}

/// Progress object as yt-dlp prints it through `%(progress)j`.
#[derive(Debug, Deserialize)]
struct RawProgress {
    status: String,
    filename: Option<PathBuf>,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
}

impl From<RawProgress> for ProgressReport {
    fn from(raw: RawProgress) -> Self {
        let status = match raw.status.as_str() {
            "finished" => DownloadStatus::Finished,
            "error" => DownloadStatus::Error,
            _ => DownloadStatus::InProgress,
        };
        ProgressReport {
            status,
            filename: raw.filename,
            downloaded_bytes: raw.downloaded_bytes.map(|b| b.max(0.0) as u64),
            total_bytes: raw.total_bytes.map(|b| b.max(0.0) as u64),
            total_bytes_estimate: raw.total_bytes_estimate,
        }
    }
}

/// Turn one line of yt-dlp stdout into a progress report, if it carries one.
/// Unmarked lines and malformed progress objects yield `None`.
pub fn parse_progress_line(line: &str) -> Option<ProgressReport> {
    let line = line.trim();
    if let Some(json) = line.strip_prefix(PROGRESS_MARKER) {
        return match serde_json::from_str::<RawProgress>(json) {
            Ok(raw) => Some(raw.into()),
            Err(e) => {
                tracing::debug!("unparseable yt-dlp progress ({}): {}", e, json);
                None
            }
        };
    }
    let path = line.strip_prefix(FILE_MARKER)?.trim();
    if path.is_empty() {
        return None;
    }
    Some(ProgressReport::new(DownloadStatus::InProgress).with_filename(path))
}

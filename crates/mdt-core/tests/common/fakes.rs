//! In-process stand-ins for the download and transcode backends.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdt_core::backend::{
    BackendError, Backends, DownloadBackend, ProgressFn, ProgressReport, TranscodeBackend,
    TranscodeRequest,
};

const STEP: Duration = Duration::from_millis(5);

/// Plays back a fixed list of progress reports, then succeeds or fails.
#[derive(Default)]
pub struct ScriptedDownload {
    pub reports: Vec<ProgressReport>,
    pub fail: bool,
    pub panic: bool,
    /// When set, the download does not return until the gate is opened.
    pub gate: Option<Gate>,
}

impl ScriptedDownload {
    pub fn new(reports: Vec<ProgressReport>) -> Self {
        Self {
            reports,
            ..Self::default()
        }
    }

    pub fn failing(reports: Vec<ProgressReport>) -> Self {
        Self {
            fail: true,
            ..Self::new(reports)
        }
    }

    pub fn gated(reports: Vec<ProgressReport>, gate: &Gate) -> Self {
        Self {
            gate: Some(gate.clone()),
            ..Self::new(reports)
        }
    }
}

impl DownloadBackend for ScriptedDownload {
    fn download(
        &self,
        _source: &str,
        _format: &str,
        on_progress: &mut ProgressFn<'_>,
    ) -> Result<(), BackendError> {
        for report in &self.reports {
            std::thread::sleep(STEP);
            if let ControlFlow::Break(()) = on_progress(report.clone()) {
                return Err(BackendError::Stopped);
            }
        }
        if let Some(gate) = &self.gate {
            gate.wait();
        }
        if self.panic {
            panic!("download backend crashed");
        }
        if self.fail {
            return Err(BackendError::Exit {
                program: "fake-download".into(),
                code: Some(1),
                stderr: "ERROR: unavailable".into(),
            });
        }
        Ok(())
    }
}

/// Records every request; writes the destination unless told to fail.
#[derive(Default)]
pub struct RecordingTranscode {
    pub fail: bool,
    pub calls: Mutex<Vec<TranscodeRequest>>,
}

impl RecordingTranscode {
    pub fn calls(&self) -> Vec<TranscodeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl TranscodeBackend for RecordingTranscode {
    fn transcode(&self, request: &TranscodeRequest) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(BackendError::Exit {
                program: "fake-ffmpeg".into(),
                code: Some(1),
                stderr: String::new(),
            });
        }
        std::fs::write(&request.destination, b"transcoded")?;
        Ok(())
    }
}

/// A latch that blocks gated downloads until opened.
#[derive(Clone, Default)]
pub struct Gate(Arc<AtomicBool>);

impl Gate {
    pub fn open(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn wait(&self) {
        while !self.0.load(Ordering::SeqCst) {
            std::thread::sleep(STEP);
        }
    }
}

pub fn backends(
    download: ScriptedDownload,
    transcode: &Arc<RecordingTranscode>,
) -> Backends {
    Backends::new(Arc::new(download), Arc::clone(transcode) as Arc<dyn TranscodeBackend>)
}

//! ffmpeg transcode adapter.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use super::process::{self, StderrTail};
use super::{BackendError, TranscodeBackend, TranscodeRequest};
use crate::config::MdtConfig;

const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Runs `ffmpeg` with the job's input/output options. Stdin is always null so
/// ffmpeg can never stop to ask a question.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: String,
    prefix_args: Vec<String>,
}

impl Ffmpeg {
    /// `command` is split on whitespace; the first word is the executable.
    pub fn new(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
        Self {
            program,
            prefix_args: words.collect(),
        }
    }

    pub fn from_config(cfg: &MdtConfig) -> Self {
        Self::new(&cfg.ffmpeg_command)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(&self, request: &TranscodeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.prefix_args.iter().map(OsString::from).collect();
        args.extend(["-loglevel", "-8", "-y"].map(OsString::from));
        args.extend(request.input_options.iter().map(OsString::from));
        args.push("-i".into());
        args.push(request.input.clone().into_os_string());
        args.extend(request.output_options.iter().map(OsString::from));
        args.push(request.destination.clone().into_os_string());
        args
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl TranscodeBackend for Ffmpeg {
    fn transcode(&self, request: &TranscodeRequest) -> Result<(), BackendError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let mut child = process::spawn(&self.program, &mut cmd)?;
        let stderr = StderrTail::capture(&self.program, child.stderr.take());
        let status = child.wait()?;
        process::check_exit(&self.program, status, stderr.finish())
    }
}

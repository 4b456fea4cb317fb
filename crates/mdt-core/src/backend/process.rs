//! Subprocess plumbing shared by the yt-dlp and ffmpeg adapters.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStderr, Command, ExitStatus};
use std::thread::JoinHandle;

use super::BackendError;

/// How many trailing stderr lines are kept for error reports.
const STDERR_TAIL_LINES: usize = 50;

pub(super) fn spawn(program: &str, cmd: &mut Command) -> Result<Child, BackendError> {
    tracing::debug!(program, "spawning {:?}", cmd);
    cmd.spawn().map_err(|source| BackendError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Drains a child's stderr on a helper thread, keeping the last lines.
pub(super) struct StderrTail(Option<JoinHandle<VecDeque<String>>>);

impl StderrTail {
    pub(super) fn capture(program: &str, stderr: Option<ChildStderr>) -> Self {
        let program = program.to_string();
        Self(stderr.map(|stream| {
            std::thread::spawn(move || {
                let mut lines = VecDeque::with_capacity(STDERR_TAIL_LINES);
                for line in BufReader::new(stream).lines().map_while(Result::ok) {
                    tracing::trace!(program = %program, "stderr: {}", line);
                    if lines.len() == STDERR_TAIL_LINES {
                        lines.pop_front();
                    }
                    lines.push_back(line);
                }
                lines
            })
        }))
    }

    /// Waits for the reader thread and returns the collected tail.
    pub(super) fn finish(self) -> String {
        self.0
            .and_then(|handle| handle.join().ok())
            .map(|lines| Vec::from(lines).join("\n"))
            .unwrap_or_default()
    }
}

/// Kill and reap a child we are abandoning.
pub(super) fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub(super) fn check_exit(
    program: &str,
    status: ExitStatus,
    stderr: String,
) -> Result<(), BackendError> {
    if status.success() {
        return Ok(());
    }
    tracing::warn!(program, code = ?status.code(), "process failed:\n{}", stderr);
    Err(BackendError::Exit {
        program: program.to_string(),
        code: status.code(),
        stderr,
    })
}

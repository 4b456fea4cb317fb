//! Backend failure kinds. A job switches on these instead of unwinding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend process could not be started (missing binary, permissions).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The backend process ran but exited unsuccessfully.
    #[error("{program} exited with {}", describe_code(*.code))]
    Exit {
        program: String,
        code: Option<i32>,
        /// Last lines of the process' stderr, for the log.
        stderr: String,
    },
    /// The download backend reported an error through its progress channel.
    #[error("download reported an error")]
    Reported,
    /// The progress callback asked the backend to stop.
    #[error("stopped by progress callback")]
    Stopped,
    /// Output from the backend could not be understood.
    #[error("unexpected output from {program}: {detail}")]
    Malformed { program: String, detail: String },
    /// The download succeeded but never said where the file went.
    #[error("download finished without reporting a file path")]
    MissingIntermediate,
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (killed by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_display_includes_code() {
        let e = BackendError::Exit {
            program: "ffmpeg".into(),
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(e.to_string(), "ffmpeg exited with status 1");

        let killed = BackendError::Exit {
            program: "yt-dlp".into(),
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }
}

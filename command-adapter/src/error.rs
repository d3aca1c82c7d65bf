use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Runner executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Failed to spawn process at stage '{stage}': {source}")]
    SpawnFailed {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process timed out after {elapsed:?} (PID: {pid})")]
    Timeout {
        elapsed: std::time::Duration,
        pid: u32,
        partial_stdout: String,
        partial_stderr: String,
    },

    #[error(
        "Process exited with code {exit_code} (PID: {pid}, elapsed: {elapsed:?})\nSTDERR: {stderr}"
    )]
    NonZeroExit {
        exit_code: i32,
        pid: u32,
        elapsed: std::time::Duration,
        stdout: String,
        stderr: String,
    },

    #[cfg(unix)]
    #[error("Failed to send signal {signal} to PID {pid}: {source}")]
    SignalFailed {
        signal: String,
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("Child process stdout was not captured")]
    NoStdout,

    #[error("Child process stderr was not captured")]
    NoStderr,

    #[error("Child process stdin was not captured")]
    NoStdin,

    #[error("Could not get PID from child process")]
    NoPid,

    #[error("Output truncated: captured {captured_bytes} bytes (limit: {limit_bytes} bytes)")]
    OutputTruncated {
        captured_bytes: usize,
        limit_bytes: usize,
    },

    #[error("Health check failed: {0}")]
    HealthCheck(String),
}

impl From<std::io::Error> for CommandError {
    fn from(error: std::io::Error) -> Self {
        Self::SpawnFailed {
            stage: "unknown".to_string(),
            source: error,
        }
    }
}

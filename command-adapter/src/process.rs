use crate::error::CommandError;
use crate::types::{CommandConfig, PromptDelivery, RunResult, StreamEvent};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;

const CHANNEL_CAPACITY: usize = 100;
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024; // 10 MB
#[cfg(unix)]
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Runs the runner once and waits for it to exit.
///
/// When `sender` is given, every stdout line is forwarded as a
/// [`StreamEvent::Text`] as soon as it is read and every stderr line as a
/// [`StreamEvent::Diagnostic`]. The complete output is returned either way.
pub async fn run_command(
    path: &Path,
    model: &str,
    prompt: &str,
    config: &CommandConfig,
    sender: Option<mpsc::Sender<StreamEvent>>,
) -> Result<RunResult, CommandError> {
    let args = crate::cmd::build_args(model, prompt, config);
    let start_time = Instant::now();

    let mut cmd = Command::new(path);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match config.prompt_delivery {
        PromptDelivery::Stdin => cmd.stdin(Stdio::piped()),
        PromptDelivery::Argument => cmd.stdin(Stdio::null()),
    };

    if let Some(cwd) = &config.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &config.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|e| CommandError::SpawnFailed {
        stage: "spawn subprocess".to_string(),
        source: e,
    })?;

    let stdout = child.stdout.take().ok_or(CommandError::NoStdout)?;
    let stderr = child.stderr.take().ok_or(CommandError::NoStderr)?;
    let pid = child.id().ok_or(CommandError::NoPid)?;

    tracing::debug!(
        target: "rig_guard",
        event = "subprocess_spawned",
        pid,
        program = %path.display(),
        model,
        "Spawned runner subprocess"
    );

    let mut join_set = JoinSet::new();

    if config.prompt_delivery == PromptDelivery::Stdin {
        let mut stdin = child.stdin.take().ok_or(CommandError::NoStdin)?;
        let payload = prompt.as_bytes().to_vec();
        join_set.spawn(async move {
            if let Err(e) = stdin.write_all(&payload).await {
                tracing::debug!(target: "rig_guard", error = %e, "Failed to write prompt to stdin");
            }
            // Dropping stdin closes the pipe so the runner sees EOF.
        });
    }

    // Bounded internal channels
    let (stdout_tx, mut stdout_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (stderr_tx, mut stderr_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let stdout_sender = sender.clone();
    join_set.spawn(async move {
        let mut reader = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if let Some(tx) = &stdout_sender {
                let _ = tx
                    .send(StreamEvent::Text {
                        text: format!("{line}\n"),
                    })
                    .await;
            }
            if stdout_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    join_set.spawn(async move {
        let mut reader = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if let Some(tx) = &sender {
                let _ = tx
                    .send(StreamEvent::Diagnostic { line: line.clone() })
                    .await;
            }
            if stderr_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut stdout_bytes = 0;
    let mut stderr_bytes = 0;

    let execution_result = timeout(config.timeout, async {
        loop {
            tokio::select! {
                Some(line) = stdout_rx.recv() => {
                    accumulate(line, &mut stdout_lines, &mut stdout_bytes)?;
                }
                Some(line) = stderr_rx.recv() => {
                    accumulate(line, &mut stderr_lines, &mut stderr_bytes)?;
                }
                status = child.wait() => {
                    let status = status.map_err(|e| CommandError::SpawnFailed {
                        stage: "wait for child".to_string(),
                        source: e,
                    })?;

                    // Readers hit EOF once the pipes close; collect what they still hold.
                    while let Some(line) = stdout_rx.recv().await {
                        accumulate(line, &mut stdout_lines, &mut stdout_bytes)?;
                    }
                    while let Some(line) = stderr_rx.recv().await {
                        accumulate(line, &mut stderr_lines, &mut stderr_bytes)?;
                    }
                    while join_set.join_next().await.is_some() {}

                    let duration = start_time.elapsed();
                    let exit_code = status.code().unwrap_or(-1);
                    let stdout = stdout_lines.join("\n");
                    let stderr = stderr_lines.join("\n");

                    if exit_code != 0 {
                        return Err(CommandError::NonZeroExit {
                            exit_code,
                            pid,
                            elapsed: duration,
                            stdout,
                            stderr,
                        });
                    }

                    return Ok(RunResult {
                        stdout,
                        stderr,
                        exit_code,
                        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    });
                }
            }
        }
    })
    .await;

    match execution_result {
        Ok(result) => result,
        Err(_timeout_elapsed) => {
            let elapsed = start_time.elapsed();
            tracing::warn!(
                target: "rig_guard",
                event = "subprocess_timeout",
                pid,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Runner subprocess timed out"
            );
            let _ = shutdown(&mut child, pid).await;

            drain_stream_bounded(&mut stdout_rx, &mut stdout_lines, &mut stdout_bytes)?;
            drain_stream_bounded(&mut stderr_rx, &mut stderr_lines, &mut stderr_bytes)?;

            join_set.abort_all();
            while join_set.join_next().await.is_some() {}

            Err(CommandError::Timeout {
                elapsed,
                pid,
                partial_stdout: stdout_lines.join("\n"),
                partial_stderr: stderr_lines.join("\n"),
            })
        }
    }
}

fn accumulate(line: String, lines: &mut Vec<String>, bytes: &mut usize) -> Result<(), CommandError> {
    *bytes += line.len();
    if *bytes > MAX_OUTPUT_BYTES {
        return Err(CommandError::OutputTruncated {
            captured_bytes: *bytes,
            limit_bytes: MAX_OUTPUT_BYTES,
        });
    }
    lines.push(line);
    Ok(())
}

/// Drain buffered lines without waiting for more.
fn drain_stream_bounded(
    rx: &mut mpsc::Receiver<String>,
    lines: &mut Vec<String>,
    bytes: &mut usize,
) -> Result<(), CommandError> {
    while let Ok(line) = rx.try_recv() {
        accumulate(line, lines, bytes)?;
    }
    Ok(())
}

/// Graceful shutdown: SIGTERM, wait grace period, then SIGKILL
#[cfg(unix)]
async fn shutdown(child: &mut tokio::process::Child, pid: u32) -> Result<(), CommandError> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| CommandError::NoPid)?;
    signal::kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(|e| {
        CommandError::SignalFailed {
            signal: "SIGTERM".to_string(),
            pid,
            source: e,
        }
    })?;

    match timeout(GRACE_PERIOD, child.wait()).await {
        Ok(Ok(_status)) => Ok(()),
        Ok(Err(e)) => Err(CommandError::SpawnFailed {
            stage: "graceful_shutdown wait".to_string(),
            source: e,
        }),
        Err(_) => force_kill(child).await,
    }
}

#[cfg(not(unix))]
async fn shutdown(child: &mut tokio::process::Child, _pid: u32) -> Result<(), CommandError> {
    force_kill(child).await
}

async fn force_kill(child: &mut tokio::process::Child) -> Result<(), CommandError> {
    child.kill().await.map_err(|e| CommandError::SpawnFailed {
        stage: "SIGKILL".to_string(),
        source: e,
    })?;
    child.wait().await.map_err(|e| CommandError::SpawnFailed {
        stage: "post-SIGKILL wait".to_string(),
        source: e,
    })?;
    Ok(())
}

//! Process runner: spawn a command with an argument array, capture its
//! streams, classify non-zero exits and timeouts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    /// Written to the child's stdin, which is then closed. When `None` the
    /// stdin handle is closed immediately so the child never blocks on input.
    pub input: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Error)]
pub enum CommandExecutionError {
    #[error("Command `{command}` failed with exit code {exit_code}")]
    Failed {
        command: String,
        args: Vec<String>,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("Command `{command}` timed out after {timeout:?}")]
    TimedOut {
        command: String,
        args: Vec<String>,
        timeout: Duration,
        stdout: String,
        stderr: String,
    },
}

impl CommandExecutionError {
    pub fn stdout(&self) -> &str {
        match self {
            Self::Failed { stdout, .. } | Self::TimedOut { stdout, .. } => stdout,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            Self::Failed { stderr, .. } | Self::TimedOut { stderr, .. } => stderr,
        }
    }
}

/// Run `command` with `args`, never through a shell.
///
/// Spawn failures (executable not found, permission denied) surface as the
/// underlying `std::io::Error`; everything after a successful spawn is
/// classified as a `CommandExecutionError`.
pub async fn run_command(
    command: &str,
    args: &[String],
    options: RunOptions,
) -> Result<CommandOutput, anyhow::Error> {
    debug!("Running command: {} {:?}", command, args);

    let mut cmd = tokio::process::Command::new(command);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Some(input) = &options.input {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                warn!("Failed to write to stdin of {}: {}", command, e);
            }
        }
        drop(stdin);
    }

    let mut stdout_pipe = child.stdout.take().expect("stdout is piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr is piped");
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    // The wait future borrows the child and both buffers, so it is scoped:
    // on timeout it is dropped before the child is killed and the partial
    // buffers are read out.
    let status = {
        let wait = async {
            let (out, err, status) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout_buf),
                stderr_pipe.read_to_end(&mut stderr_buf),
                child.wait(),
            );
            out?;
            err?;
            status
        };

        match options.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, wait).await {
                Ok(status) => Some(status),
                Err(_) => None,
            },
            None => Some(wait.await),
        }
    };

    let status = match status {
        Some(status) => status?,
        None => {
            let _ = child.kill().await;
            return Err(CommandExecutionError::TimedOut {
                command: command.to_string(),
                args: args.to_vec(),
                timeout: options.timeout.unwrap_or_default(),
                stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
            }
            .into());
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_buf).into_owned();
    let exit_code = status.code().unwrap_or(-1);

    if status.success() {
        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        })
    } else {
        Err(CommandExecutionError::Failed {
            command: command.to_string(),
            args: args.to_vec(),
            exit_code,
            stdout,
            stderr,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_command_captures_stdout() {
        let output = run_command("echo", &["hello".to_string()], RunOptions::default())
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_command_pipes_input() {
        let output = run_command(
            "cat",
            &[],
            RunOptions {
                input: Some("from stdin".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(output.stdout, "from stdin");
    }

    #[tokio::test]
    async fn test_run_command_closes_stdin_without_input() {
        // cat with no input must terminate instead of blocking forever.
        let output = run_command("cat", &[], RunOptions::default()).await.unwrap();
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_run_command_nonzero_exit() {
        let err = run_command(
            "sh",
            &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
            RunOptions::default(),
        )
        .await
        .unwrap_err();

        let cmd_err = err
            .downcast_ref::<CommandExecutionError>()
            .expect("expected CommandExecutionError");
        match cmd_err {
            CommandExecutionError::Failed {
                exit_code,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(*exit_code, 3);
                assert_eq!(stdout.trim(), "out");
                assert_eq!(stderr.trim(), "err");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_spawn_failure_is_io_error() {
        let err = run_command(
            "/nonexistent/binary/for/meetnote",
            &[],
            RunOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(err.downcast_ref::<CommandExecutionError>().is_none());
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }

    #[tokio::test]
    async fn test_run_command_timeout_kills_child() {
        let err = run_command(
            "sh",
            &["-c".to_string(), "echo partial; sleep 5".to_string()],
            RunOptions {
                timeout: Some(Duration::from_millis(300)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        match err.downcast_ref::<CommandExecutionError>() {
            Some(CommandExecutionError::TimedOut { stdout, .. }) => {
                assert_eq!(stdout.trim(), "partial");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_uses_cwd() {
        let dir = std::env::temp_dir();
        let output = run_command(
            "pwd",
            &[],
            RunOptions {
                cwd: Some(dir.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.canonicalize().unwrap()
        );
    }
}

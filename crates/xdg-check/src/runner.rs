//! External validator execution.

use crate::error::CommandError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Runs an external command and maps its exit status to a result.
///
/// Success is exit code zero and yields the trimmed stdout. Any other exit
/// yields [`CommandError::Failed`] carrying the captured output; a process
/// that cannot be spawned yields [`CommandError::Launch`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError>;
}

/// Runs commands as child processes, optionally inside a working directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command from `dir`, so repository-relative paths resolve.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: Some(dir.as_ref().to_path_buf()),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, CommandError> {
        let start = Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|source| CommandError::Launch {
                program: program.to_string(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        debug!(
            program = %program,
            exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );

        if output.status.success() {
            Ok(stdout.trim().to_string())
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                code: exit_code,
                message: failure_message(program, exit_code, &stdout, &stderr),
            })
        }
    }
}

/// Message for a failed run: trimmed stdout, else trimmed stderr, else a
/// generic line naming the exit code.
pub fn failure_message(program: &str, exit_code: i32, stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    format!("{} exited with status {}", program, exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_failure_message_prefers_stdout() {
        let msg = failure_message("v", 1, "  out line\n", "err line");
        assert_eq!(msg, "out line");
    }

    #[test]
    fn test_failure_message_falls_back_to_stderr() {
        let msg = failure_message("v", 1, " \n", "\nerr line\n");
        assert_eq!(msg, "err line");
    }

    #[test]
    fn test_failure_message_when_silent() {
        let msg = failure_message("desktop-file-validate", 2, "", "");
        assert_eq!(msg, "desktop-file-validate exited with status 2");
    }

    #[tokio::test]
    async fn test_run_success_trims_stdout() {
        let runner = ProcessRunner::new();
        let out = runner
            .run("echo", &args(&["  hello  "]))
            .await
            .expect("echo succeeds");
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_is_failure() {
        let runner = ProcessRunner::new();
        let err = runner.run("false", &[]).await.unwrap_err();
        match err {
            CommandError::Failed { program, code, .. } => {
                assert_eq!(program, "false");
                assert_ne!(code, 0);
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_failure_surfaces_stderr() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("sh", &args(&["-c", "echo 'broken entry' >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            CommandError::Failed { code, message, .. } => {
                assert_eq!(code, 3);
                assert_eq!(message, "broken entry");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_failure_prefers_stdout_over_stderr() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("sh", &args(&["-c", "echo on-stdout; echo on-stderr >&2; exit 1"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "on-stdout");
    }

    #[tokio::test]
    async fn test_run_missing_binary_is_launch_error() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("xdg-check-no-such-validator", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Launch { .. }));
        assert!(err.to_string().contains("xdg-check-no-such-validator"));
    }

    #[tokio::test]
    async fn test_run_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.desktop"), b"").unwrap();

        let runner = ProcessRunner::in_dir(dir.path());
        let out = runner
            .run("ls", &args(&["marker.desktop"]))
            .await
            .expect("ls finds the file relative to the working dir");
        assert_eq!(out, "marker.desktop");
    }
}

//! One-shot subprocess capture.
//!
//! Used for the startup probes (`pidstat -V`, `jps -q`) and the per-tick
//! `jstack` invocation. No timeouts are applied: a hang in an external tool
//! hangs the pipeline, which is an operational incident rather than a
//! condition the sampler recovers from.

use std::io;
use std::process::{Command, Output};

/// Result of a one-shot subprocess execution.
#[derive(Debug)]
pub enum CaptureResult {
    /// Command ran and exited with status zero.
    Success(Output),
    /// Command ran and exited with a non-zero status.
    Failed(Output),
    /// Command could not be spawned at all.
    SpawnError(io::Error),
}

impl CaptureResult {
    /// Returns stdout as a string when the command actually ran.
    #[must_use]
    pub fn stdout_string(&self) -> Option<String> {
        match self {
            Self::Success(output) | Self::Failed(output) => {
                Some(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Self::SpawnError(_) => None,
        }
    }

    /// Returns stdout, falling back to stderr when stdout is empty — some
    /// tools report their version or diagnostics on stderr.
    #[must_use]
    pub fn output_string(&self) -> Option<String> {
        match self {
            Self::Success(output) | Self::Failed(output) => {
                let stream = if output.stdout.is_empty() {
                    &output.stderr
                } else {
                    &output.stdout
                };
                Some(String::from_utf8_lossy(stream).to_string())
            }
            Self::SpawnError(_) => None,
        }
    }

    /// Returns true if the command completed with status zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Runs a command to completion, capturing stdout and stderr.
pub fn run_capture(cmd: &str, args: &[&str]) -> CaptureResult {
    match Command::new(cmd).args(args).output() {
        Ok(output) if output.status.success() => CaptureResult::Success(output),
        Ok(output) => CaptureResult::Failed(output),
        Err(err) => CaptureResult::SpawnError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command() {
        let result = run_capture("echo", &["hello"]);
        assert!(result.is_success());
        assert_eq!(result.stdout_string().unwrap().trim(), "hello");
    }

    #[test]
    fn test_command_with_args() {
        let result = run_capture("printf", &["%s %s", "foo", "bar"]);
        assert!(result.is_success());
        assert_eq!(result.stdout_string().unwrap(), "foo bar");
    }

    #[test]
    fn test_failed_command() {
        let result = run_capture("false", &[]);
        assert!(matches!(result, CaptureResult::Failed(_)));
    }

    #[test]
    fn test_nonexistent_command() {
        let result = run_capture("this_command_does_not_exist_12345", &[]);
        assert!(matches!(result, CaptureResult::SpawnError(_)));
        assert!(result.stdout_string().is_none());
    }

    #[test]
    fn test_output_string_falls_back_to_stderr() {
        let result = run_capture("sh", &["-c", "echo oops >&2; exit 1"]);
        assert_eq!(result.output_string().unwrap().trim(), "oops");
    }
}

//! Error types for the sampling pipeline.
//!
//! Only environment failures surface as errors: a missing target process or
//! an external tool that cannot be started aborts the run before the
//! sampling loop. Transient conditions (vanished threads, malformed report
//! rows, paint failures during a resize) are handled where they occur and
//! never reach this type.

use std::io;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised during startup and terminal handling.
#[derive(Debug, Error)]
pub enum Error {
    /// The target process id does not exist.
    #[error("PID {0} not exist")]
    ProcessNotFound(u32),

    /// An external tool could not be started.
    #[error("'{tool}' could not be run: {message}")]
    ToolUnavailable {
        /// The tool that failed to start.
        tool: &'static str,
        /// Error message describing the failure.
        message: String,
    },

    /// Terminal initialization or restoration error.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_not_found_includes_pid() {
        let err = Error::ProcessNotFound(12345);
        let display = err.to_string();

        assert!(
            display.contains("12345"),
            "Error should include the PID: {}",
            display
        );
    }

    #[test]
    fn test_tool_unavailable_includes_tool_and_message() {
        let err = Error::ToolUnavailable {
            tool: "pidstat",
            message: "No such file or directory".to_string(),
        };
        let display = err.to_string();

        assert!(
            display.contains("pidstat"),
            "Error should include the tool name: {}",
            display
        );
        assert!(
            display.contains("No such file"),
            "Error should include the message: {}",
            display
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "tty gone");
        let err: Error = io_err.into();

        assert!(
            matches!(err, Error::Terminal(_)),
            "Should convert to Terminal"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}

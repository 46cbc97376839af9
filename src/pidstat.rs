//! pidstat invocation and the block-oriented line source.
//!
//! One pidstat process runs for the whole session, emitting a per-thread
//! report every second. Its stdout is consumed as an infinite sequence of
//! blocks, one block per sampling tick, delimited by the short separator
//! lines of the report format.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::error::{Error, Result};
use crate::subprocess::{run_capture, CaptureResult};

/// Report lines at or under this trimmed length are block separators.
const MIN_ROW_LEN: usize = 10;

/// Column layout of the pidstat report, decided once at startup from the
/// tool's self-reported version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnLayout {
    /// sysstat 11.6 and later: separate %wait column, `-H` supported.
    Current,
    /// Older sysstat without a %wait column.
    Legacy,
}

impl ColumnLayout {
    /// Parses a `<major>.<minor>[...]` version string. A version that does
    /// not carry at least a major and minor component is treated as legacy.
    #[must_use]
    pub fn from_version(version: &str) -> Self {
        let mut parts = version.trim().split('.');
        let major: Option<u32> = parts.next().and_then(|part| part.parse().ok());
        let minor: Option<u32> = parts.next().and_then(|part| part.parse().ok());
        match (major, minor) {
            (Some(major), Some(_)) if major > 11 => Self::Current,
            (Some(11), Some(minor)) if minor >= 6 => Self::Current,
            _ => Self::Legacy,
        }
    }

    /// Short tag for the startup log.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Current => "New",
            Self::Legacy => "Old",
        }
    }
}

/// Probes `pidstat -V` and returns the version token (third whitespace
/// field of the first output line).
pub fn detect_version() -> Result<String> {
    match run_capture("pidstat", &["-V"]) {
        CaptureResult::SpawnError(err) => Err(Error::ToolUnavailable {
            tool: "pidstat",
            message: err.to_string(),
        }),
        result => {
            let output = result.output_string().unwrap_or_default();
            Ok(output
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(2))
                .unwrap_or_default()
                .to_string())
        }
    }
}

/// The running pidstat subprocess and its report stream.
pub struct PidstatSource {
    child: Child,
    stdout: Option<ChildStdout>,
}

impl PidstatSource {
    /// Spawns `pidstat -u -d -t -h [-H] -p <pid> 1` with colors disabled.
    /// `-H` keeps the Time column a single epoch token, but only current
    /// layouts support it.
    pub fn spawn(pid: u32, layout: ColumnLayout) -> Result<Self> {
        let mut command = Command::new("pidstat");
        command.args(["-u", "-d", "-t", "-h"]);
        if layout == ColumnLayout::Current {
            command.arg("-H");
        }
        command
            .arg("-p")
            .arg(pid.to_string())
            .arg("1")
            .env("S_COLORS", "never")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn().map_err(|err| Error::ToolUnavailable {
            tool: "pidstat",
            message: err.to_string(),
        })?;
        let stdout = child.stdout.take();
        Ok(Self { child, stdout })
    }

    /// Process id of the spawned pidstat, for the interrupt handler.
    #[must_use]
    pub fn child_id(&self) -> u32 {
        self.child.id()
    }

    /// Takes the block stream. Reads block until pidstat exits.
    pub fn blocks(&mut self) -> Result<Blocks<BufReader<ChildStdout>>> {
        let stdout = self.stdout.take().ok_or_else(|| Error::ToolUnavailable {
            tool: "pidstat",
            message: "report stream already taken".to_string(),
        })?;
        Ok(Blocks::new(BufReader::new(stdout)))
    }

    /// Drains pidstat's stderr after the report stream ends and logs
    /// whatever the tool had to say. Non-fatal by definition: the stream is
    /// already over.
    pub fn drain_stderr(&mut self) {
        if let Some(mut stderr) = self.child.stderr.take() {
            let mut buf = String::new();
            if stderr.read_to_string(&mut buf).is_ok() {
                let message = buf.trim();
                if !message.is_empty() {
                    log::info!("Error from pidstat: {message}");
                }
            }
        }
        let _ = self.child.wait();
    }
}

/// Groups report lines into per-tick blocks.
///
/// Trimmed lines longer than [`MIN_ROW_LEN`] accumulate into the current
/// block; anything shorter is a separator that flushes a non-empty block.
/// The final partial block is dropped at EOF.
pub struct Blocks<R> {
    reader: R,
}

impl<R: BufRead> Blocks<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for Blocks<R> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut block = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.len() > MIN_ROW_LEN {
                        block.push(trimmed.to_string());
                    } else if !block.is_empty() {
                        return Some(block);
                    }
                }
                Err(err) => {
                    log::info!("error reading pidstat output: {err}");
                    return None;
                }
            }
        }
    }
}

//! Per-thread scheduler counters from `/proc/<pid>/task/<tid>/schedstat`.
//!
//! The file holds exactly three whitespace-separated unsigned integers:
//! cumulative time on CPU (nanoseconds), cumulative run-queue wait time
//! (nanoseconds), and the number of timeslices run on the current CPU.

use std::fs;
use std::path::PathBuf;

use crate::stats::ThreadId;

/// Reads the cumulative schedstat counters for threads of one process.
///
/// The proc root is injectable so tests can point it at a scratch
/// directory.
#[derive(Debug, Clone)]
pub struct SchedstatReader {
    proc_root: PathBuf,
    pid: u32,
}

impl SchedstatReader {
    #[must_use]
    pub fn new(pid: u32) -> Self {
        Self::with_root("/proc", pid)
    }

    pub fn with_root(proc_root: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            proc_root: proc_root.into(),
            pid,
        }
    }

    /// Returns `(on_cpu_nanos, run_queue_nanos, timeslices)`, or `None`
    /// when the thread no longer exists. Threads vanishing between ticks
    /// is expected and frequent; the caller skips the update and keeps the
    /// last-known deltas.
    #[must_use]
    pub fn read(&self, tid: ThreadId) -> Option<(u64, u64, u64)> {
        let path = self
            .proc_root
            .join(self.pid.to_string())
            .join("task")
            .join(tid.to_string())
            .join("schedstat");
        let content = fs::read_to_string(path).ok()?;
        let mut fields = content.split_whitespace();
        let on_cpu = fields.next()?.parse().ok()?;
        let run_queue = fields.next()?.parse().ok()?;
        let timeslices = fields.next()?.parse().ok()?;
        Some((on_cpu, run_queue, timeslices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_schedstat(root: &std::path::Path, pid: u32, tid: u32, content: &str) {
        let task = root.join(pid.to_string()).join("task").join(tid.to_string());
        fs::create_dir_all(&task).unwrap();
        fs::write(task.join("schedstat"), content).unwrap();
    }

    #[test]
    fn test_read_three_counters() {
        let dir = tempfile::tempdir().unwrap();
        write_schedstat(dir.path(), 1234, 5678, "123456789 987654 42\n");

        let reader = SchedstatReader::with_root(dir.path(), 1234);
        assert_eq!(reader.read(5678), Some((123_456_789, 987_654, 42)));
    }

    #[test]
    fn test_missing_thread_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let reader = SchedstatReader::with_root(dir.path(), 1234);

        assert_eq!(reader.read(5678), None, "vanished thread reads as None");
    }

    #[test]
    fn test_garbage_content_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_schedstat(dir.path(), 1234, 5678, "not numbers here\n");

        let reader = SchedstatReader::with_root(dir.path(), 1234);
        assert_eq!(reader.read(5678), None);
    }

    #[test]
    fn test_truncated_content_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_schedstat(dir.path(), 1234, 5678, "123 456\n");

        let reader = SchedstatReader::with_root(dir.path(), 1234);
        assert_eq!(reader.read(5678), None);
    }
}

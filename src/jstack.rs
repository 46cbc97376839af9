//! Optional thread-name and stack enrichment via `jstack`.
//!
//! When the target process is an instrumented HotSpot JVM, one `jstack`
//! call per tick provides human-readable thread names and a bounded stack
//! snippet for the selected threads. The enricher is a no-capability
//! collaborator in every other case: it returns empty maps and previously
//! known names and snippets stay in the registry.

use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::stats::ThreadId;
use crate::subprocess::{run_capture, CaptureResult};

/// Name and bounded stack snippet for one thread, parsed out of a whole
/// process dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDump {
    pub name: String,
    pub snippet: String,
}

/// Per-tick stack collector for one target process.
#[derive(Debug)]
pub struct JstackEnricher {
    pid: u32,
    enabled: bool,
    instrumented: bool,
}

impl JstackEnricher {
    /// Probes instrumentation at construction; the result also feeds the
    /// title row, so the probe runs even when enrichment is disabled.
    #[must_use]
    pub fn new(pid: u32, enabled: bool) -> Self {
        Self {
            pid,
            enabled,
            instrumented: is_instrumented_jvm(pid),
        }
    }

    /// True when the target pid shows up in `jps -q`.
    #[must_use]
    pub fn is_instrumented(&self) -> bool {
        self.instrumented
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.instrumented
    }

    /// Dumps the whole process once and materializes entries for the
    /// selected tids only, bounding the cost to the rendered set.
    #[must_use]
    pub fn collect(&self, selected: &[ThreadId], max_depth: usize) -> HashMap<ThreadId, ThreadDump> {
        if !self.is_active() {
            return HashMap::new();
        }
        let pid = self.pid.to_string();
        let result = run_capture("jstack", &[&pid]);
        if let CaptureResult::SpawnError(err) = &result {
            log::info!("jstack failed to run: {err}");
        }
        match result.output_string() {
            Some(output) => parse_dump(&output, selected, max_depth),
            None => HashMap::new(),
        }
    }
}

/// Splits a jstack dump into thread blocks and keeps the selected ones.
///
/// Blocks are separated by double line breaks; a block describes a thread
/// iff it contains a `tid=` marker. The thread id comes from the
/// `nid=<hex>` field and the display name from the first double-quoted
/// substring. The snippet keeps the two header lines plus up to
/// `max_depth` frames.
#[must_use]
pub fn parse_dump(
    dump: &str,
    selected: &[ThreadId],
    max_depth: usize,
) -> HashMap<ThreadId, ThreadDump> {
    let wanted: HashSet<ThreadId> = selected.iter().copied().collect();
    let mut dumps = HashMap::new();
    for block in dump.split("\n\n") {
        if !block.contains("tid=") {
            continue;
        }
        let Some(tid) = native_thread_id(block) else {
            continue;
        };
        if !wanted.contains(&tid) {
            continue;
        }
        let name = block
            .split('"')
            .nth(1)
            .map_or_else(|| "-name not found-".to_string(), str::to_string);
        let snippet = block
            .lines()
            .take(2 + max_depth)
            .collect::<Vec<_>>()
            .join("\n");
        dumps.insert(tid, ThreadDump { name, snippet });
    }
    dumps
}

/// Extracts the `nid=` value, hexadecimal with or without a `0x` prefix.
fn native_thread_id(block: &str) -> Option<ThreadId> {
    let start = block.find("nid=")? + 4;
    let end = block[start..]
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .map_or(block.len(), |offset| start + offset);
    let digits = block[start..end].strip_prefix("0x").unwrap_or(&block[start..end]);
    ThreadId::from_str_radix(digits, 16).ok()
}

fn is_instrumented_jvm(pid: u32) -> bool {
    if !tool_on_path("jps") {
        return false;
    }
    let Some(output) = run_capture("jps", &["-q"]).stdout_string() else {
        return false;
    };
    let pid = pid.to_string();
    output.lines().any(|line| line.trim() == pid)
}

/// PATH scan: any entry holding an executable file named `tool`.
fn tool_on_path(tool: &str) -> bool {
    let Some(path) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path).any(|dir| is_executable(&dir.join(tool)))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

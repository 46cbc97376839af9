//! Ranking engine: pluggable sort key and top-N selection.

use std::cmp::Ordering;

use crate::stats::{ThreadId, ThreadRecord, ThreadRegistry};

/// Metric the per-tick thread ranking is keyed on. Resolved once at
/// startup from the CLI field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Cpu,
    RunQueue,
    Disk,
    DiskRead,
    DiskWrite,
}

impl SortField {
    /// Resolves a CLI field name. Unknown names fall back to CPU with a
    /// logged notice, never an error.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "cpu" => Self::Cpu,
            "rq" => Self::RunQueue,
            "disk" => Self::Disk,
            "disk-rd" => Self::DiskRead,
            "disk-wr" => Self::DiskWrite,
            other => {
                log::info!("unknown sort field '{other}', sorting by CPU instead");
                Self::Cpu
            }
        }
    }

    /// Human-readable description shown in the title row.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cpu => "Sorting by CPU",
            Self::RunQueue => "Sorting by run-queue latency",
            Self::Disk => "Sorting by Disk (read/sec + write/sec)",
            Self::DiskRead => "Sorting by Disk (read/sec)",
            Self::DiskWrite => "Sorting by Disk (write/sec)",
        }
    }

    fn key(&self, record: &ThreadRecord) -> f64 {
        match self {
            Self::Cpu => record.cpu.total_pct,
            Self::RunQueue => record.scheduler.delta_run_queue_nanos as f64,
            Self::Disk => record.disk.read_kb_per_sec + record.disk.write_kb_per_sec,
            Self::DiskRead => record.disk.read_kb_per_sec,
            Self::DiskWrite => record.disk.write_kb_per_sec,
        }
    }
}

/// Selects the tids to render this tick: stable descending sort by the
/// field's key, truncated to `top`. A negative `top` keeps every known
/// thread, zero keeps none. Ties keep registry iteration order.
#[must_use]
pub fn top_threads(registry: &ThreadRegistry, field: SortField, top: i32) -> Vec<ThreadId> {
    let mut records: Vec<&ThreadRecord> = registry.records().collect();
    records.sort_by(|a, b| {
        field
            .key(b)
            .partial_cmp(&field.key(a))
            .unwrap_or(Ordering::Equal)
    });
    let selected = records.iter().map(|record| record.id);
    if top < 0 {
        selected.collect()
    } else {
        selected.take(top as usize).collect()
    }
}

//! Per-thread styled-line template and viewport-budgeted assembly.
//!
//! Both renderers share the same template; only the mapping from tones to
//! concrete styling differs. The budget counts logical lines against the
//! viewport height so that generation stops as soon as a line would land
//! outside the visible region — later-ranked threads are omitted, not
//! queued.

use crate::stats::{ThreadId, ThreadRecord, ThreadRegistry};
use crate::text::{Chunk, StyledLine, Tone};
use crate::theme::{cpu_tone, format_nanos, io_tone, latency_tone};

/// First usable row inside the chrome (border plus title row).
const FIRST_ROW: usize = 2;

/// Builds the logical lines for one tick, thread by thread in rank order,
/// stopping once `max_lines` is reached.
#[must_use]
pub fn collect_lines(
    registry: &ThreadRegistry,
    selected: &[ThreadId],
    max_lines: usize,
) -> Vec<StyledLine> {
    let mut lines = Vec::new();
    let mut position = FIRST_ROW;
    for tid in selected {
        let Some(record) = registry.get(*tid) else {
            continue;
        };
        let (thread_lines, next) = thread_lines(record, position, max_lines);
        lines.extend(thread_lines);
        position = next;
        if position >= max_lines {
            break;
        }
    }
    lines
}

/// The fixed per-thread template, in order: bold header, composite CPU
/// line, I/O line, stack snippet, blank separator. Emission stops as soon
/// as the running position hits the budget.
#[must_use]
pub fn thread_lines(
    record: &ThreadRecord,
    mut position: usize,
    max_lines: usize,
) -> (Vec<StyledLine>, usize) {
    let mut lines = Vec::new();
    if position >= max_lines {
        return (lines, position);
    }

    lines.push(vec![Chunk::new(
        format!(
            "Thread [tid {} CPU #{:>2}] \"{}\"",
            record.id,
            record.cpu.core_id,
            record.display_name()
        ),
        Tone::Header,
    )]);
    position += 1;
    if position >= max_lines {
        return (lines, position);
    }

    lines.push(cpu_line(record));
    position += 1;
    if position >= max_lines {
        return (lines, position);
    }

    lines.push(disk_line(record));
    position += 1;
    if position >= max_lines {
        return (lines, position);
    }

    for stack_line in record.stack_snippet().lines() {
        lines.push(vec![Chunk::plain(stack_line)]);
        position += 1;
        if position >= max_lines {
            return (lines, position);
        }
    }

    lines.push(vec![Chunk::plain("")]);
    position += 1;

    (lines, position)
}

fn cpu_line(record: &ThreadRecord) -> StyledLine {
    let cpu = &record.cpu;
    let sched = &record.scheduler;
    vec![
        Chunk::plain("CPU "),
        Chunk::new(format!("{:.2}%", cpu.total_pct), cpu_tone(cpu.total_pct)),
        Chunk::plain(" [%usr: "),
        Chunk::new(format!("{:.2}", cpu.user_pct), cpu_tone(cpu.user_pct)),
        Chunk::plain(", %system: "),
        Chunk::new(format!("{:.2}", cpu.system_pct), cpu_tone(cpu.system_pct)),
        Chunk::plain(", %guest: "),
        Chunk::new(format!("{:.2}", cpu.guest_pct), cpu_tone(cpu.guest_pct)),
        Chunk::plain(", %wait: "),
        Chunk::new(format!("{:.2}", cpu.wait_pct), cpu_tone(cpu.wait_pct)),
        Chunk::plain("] [spent in CPU: "),
        Chunk::plain(format_nanos(sched.delta_on_cpu_nanos)),
        Chunk::plain(", run-queue latency: "),
        Chunk::new(
            format_nanos(sched.delta_run_queue_nanos),
            latency_tone(sched.delta_run_queue_nanos),
        ),
        Chunk::plain(", # of timeslices run in current CPU: "),
        Chunk::plain(sched.timeslices.to_string()),
        Chunk::plain("]"),
    ]
}

fn disk_line(record: &ThreadRecord) -> StyledLine {
    let disk = &record.disk;
    vec![
        Chunk::plain("I/O disk [kB_rd/s: "),
        Chunk::new(
            format!("{:.2}", disk.read_kb_per_sec),
            io_tone(disk.read_kb_per_sec),
        ),
        Chunk::plain(", kB_wr/s: "),
        Chunk::new(
            format!("{:.2}", disk.write_kb_per_sec),
            io_tone(disk.write_kb_per_sec),
        ),
        Chunk::plain("]"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tid: ThreadId) -> ThreadRecord {
        let mut registry = ThreadRegistry::new();
        registry.get_or_create(tid);
        registry.get(tid).unwrap().clone()
    }

    fn line_text(line: &StyledLine) -> String {
        line.iter().map(|chunk| chunk.text.as_str()).collect()
    }

    #[test]
    fn test_template_order_and_header() {
        let mut rec = record(1234);
        rec.name = "worker".to_string();
        rec.cpu.core_id = "3".to_string();

        let (lines, _) = thread_lines(&rec, 2, 100);

        assert_eq!(line_text(&lines[0]), "Thread [tid 1234 CPU # 3] \"worker\"");
        assert_eq!(lines[0][0].tone, Tone::Header);
        assert!(line_text(&lines[1]).starts_with("CPU "));
        assert!(line_text(&lines[2]).starts_with("I/O disk [kB_rd/s: "));
        assert_eq!(line_text(&lines[3]), "no dump provided");
        assert_eq!(line_text(lines.last().unwrap()), "");
    }

    #[test]
    fn test_critical_cpu_chunk() {
        let mut rec = record(1234);
        rec.cpu.total_pct = 85.50;

        let (lines, _) = thread_lines(&rec, 2, 100);
        let total_chunk = &lines[1][1];

        assert_eq!(total_chunk.text, "85.50%");
        assert_eq!(total_chunk.tone, Tone::Critical);
    }

    #[test]
    fn test_latency_chunk_uses_latency_scale() {
        let mut rec = record(7);
        rec.scheduler.delta_run_queue_nanos = 2_000_000;

        let (lines, _) = thread_lines(&rec, 2, 100);
        let latency_chunk = lines[1]
            .iter()
            .find(|chunk| chunk.text.contains("millis"))
            .expect("latency chunk present");

        assert_eq!(latency_chunk.tone, Tone::Critical);
    }

    #[test]
    fn test_stack_snippet_spans_lines() {
        let mut rec = record(7);
        rec.stack = "\"worker\" nid=0x7\n   State: RUNNABLE\n\tat a.b(C.java:1)".to_string();

        let (lines, _) = thread_lines(&rec, 2, 100);

        // Header + cpu + io + 3 snippet lines + blank.
        assert_eq!(lines.len(), 7);
        assert_eq!(line_text(&lines[4]), "   State: RUNNABLE");
    }

    #[test]
    fn test_budget_stops_emission_mid_template() {
        let rec = record(7);
        let (lines, position) = thread_lines(&rec, 2, 4);

        assert_eq!(lines.len(), 2, "header and CPU line fit, nothing more");
        assert_eq!(position, 4);
    }

    #[test]
    fn test_budget_exhausted_before_thread() {
        let rec = record(7);
        let (lines, position) = thread_lines(&rec, 10, 10);

        assert!(lines.is_empty());
        assert_eq!(position, 10);
    }

    #[test]
    fn test_collect_lines_omits_later_threads() {
        let mut registry = ThreadRegistry::new();
        for tid in 1..=5 {
            registry.get_or_create(tid);
        }
        let selected: Vec<ThreadId> = (1..=5).collect();

        // Each thread needs five lines; a 12-row budget (minus the chrome
        // offset of 2) fits two threads only.
        let lines = collect_lines(&registry, &selected, 12);
        let headers = lines
            .iter()
            .filter(|line| line_text(line).starts_with("Thread [tid"))
            .count();

        assert_eq!(headers, 2, "later-ranked threads are omitted, not queued");
    }

    #[test]
    fn test_collect_lines_skips_unknown_tids() {
        let registry = ThreadRegistry::new();
        let lines = collect_lines(&registry, &[99], 50);

        assert!(lines.is_empty());
    }
}

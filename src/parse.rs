//! Dual-layout pidstat row parser.
//!
//! pidstat interleaves headers and summary rows with data rows in the same
//! stream, so row validity is a predicate, not an error: anything that is
//! too short or whose tid token is not a plain integer is skipped silently.

use crate::pidstat::ColumnLayout;
use crate::stats::{ThreadId, ThreadRegistry};

/// Fixed token offsets for one report layout (whitespace-split, 0-based).
struct Offsets {
    min_tokens: usize,
    tid: usize,
    user: usize,
    system: usize,
    guest: usize,
    wait: Option<usize>,
    total: usize,
    core: usize,
    read_kb: usize,
    write_kb: usize,
    command: usize,
}

/// sysstat 11.6+: Time UID TGID TID %usr %system %guest %wait %CPU CPU
/// kB_rd/s kB_wr/s kB_ccwr/s iodelay Command
const CURRENT: Offsets = Offsets {
    min_tokens: 15,
    tid: 3,
    user: 4,
    system: 5,
    guest: 6,
    wait: Some(7),
    total: 8,
    core: 9,
    read_kb: 10,
    write_kb: 11,
    command: 14,
};

/// Older sysstat: no %wait column. The core and kB_rd/s offsets coincide in
/// this report shape.
const LEGACY: Offsets = Offsets {
    min_tokens: 14,
    tid: 3,
    user: 4,
    system: 5,
    guest: 6,
    wait: None,
    total: 7,
    core: 9,
    read_kb: 9,
    write_kb: 10,
    command: 13,
};

impl ColumnLayout {
    fn offsets(self) -> &'static Offsets {
        match self {
            Self::Current => &CURRENT,
            Self::Legacy => &LEGACY,
        }
    }
}

/// Applies one report block to the registry, creating or updating the CPU
/// and disk samples (and display name) of every valid data row. This is the
/// only writer of those fields.
pub fn apply_block(registry: &mut ThreadRegistry, lines: &[String], layout: ColumnLayout) {
    let offsets = layout.offsets();
    for line in lines {
        apply_row(registry, line, offsets);
    }
}

fn apply_row(registry: &mut ThreadRegistry, line: &str, offsets: &Offsets) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < offsets.min_tokens {
        return;
    }
    let Some(tid) = parse_tid(tokens[offsets.tid]) else {
        return;
    };
    let record = registry.get_or_create(tid);
    record.cpu.core_id = tokens[offsets.core].to_string();
    record.cpu.user_pct = float_field(&tokens, offsets.user);
    record.cpu.system_pct = float_field(&tokens, offsets.system);
    record.cpu.guest_pct = float_field(&tokens, offsets.guest);
    record.cpu.wait_pct = offsets.wait.map_or(0.0, |index| float_field(&tokens, index));
    record.cpu.total_pct = float_field(&tokens, offsets.total);
    record.disk.read_kb_per_sec = float_field(&tokens, offsets.read_kb);
    record.disk.write_kb_per_sec = float_field(&tokens, offsets.write_kb);
    record.name = tokens[offsets.command].to_string();
}

/// A tid token is a run of ASCII digits; anything else marks a header or
/// summary row.
fn parse_tid(token: &str) -> Option<ThreadId> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// A missing or unparsable numeric field reads as 0.0, never an error.
fn float_field(tokens: &[&str], index: usize) -> f64 {
    tokens
        .get(index)
        .and_then(|token| token.parse().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_ROW: &str = "1754550000  1000  -  5678   12.00  3.00  0.00  1.50  16.50  2  128.00  64.00  0.00  0  |__worker";
    const CURRENT_HEADER: &str =
        "# Time  UID  TGID  TID  %usr  %system  %guest  %wait  %CPU  CPU  kB_rd/s  kB_wr/s  kB_ccwr/s  iodelay  Command";

    fn block(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| (*l).to_string()).collect()
    }

    #[test]
    fn test_current_layout_row() {
        let mut registry = ThreadRegistry::new();
        apply_block(&mut registry, &block(&[CURRENT_ROW]), ColumnLayout::Current);

        let record = registry.get(5678).expect("row creates the record");
        assert_eq!(record.cpu.user_pct, 12.00);
        assert_eq!(record.cpu.system_pct, 3.00);
        assert_eq!(record.cpu.guest_pct, 0.00);
        assert_eq!(record.cpu.wait_pct, 1.50);
        assert_eq!(record.cpu.total_pct, 16.50);
        assert_eq!(record.cpu.core_id, "2");
        assert_eq!(record.disk.read_kb_per_sec, 128.00);
        assert_eq!(record.disk.write_kb_per_sec, 64.00);
        assert_eq!(record.name, "|__worker");
    }

    #[test]
    fn test_header_and_summary_rows_are_skipped() {
        let mut registry = ThreadRegistry::new();
        apply_block(
            &mut registry,
            &block(&[CURRENT_HEADER, "Average: something short"]),
            ColumnLayout::Current,
        );

        assert!(registry.is_empty(), "no record from non-data rows");
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let mut registry = ThreadRegistry::new();
        let lines = block(&[CURRENT_ROW]);
        apply_block(&mut registry, &lines, ColumnLayout::Current);
        let first = registry.get(5678).unwrap().clone();

        apply_block(&mut registry, &lines, ColumnLayout::Current);
        let second = registry.get(5678).unwrap();

        assert_eq!(first.cpu, second.cpu);
        assert_eq!(first.disk, second.disk);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_legacy_layout_row() {
        // Time UID TGID TID %usr %system %guest %CPU CPU ... Command, no
        // %wait column.
        let row = "1754550000  1000  -  4321   8.00  2.00  0.00  10.00  1  32.00  16.00  0.00  0  |__loader";
        let mut registry = ThreadRegistry::new();
        apply_block(&mut registry, &block(&[row]), ColumnLayout::Legacy);

        let record = registry.get(4321).expect("row creates the record");
        assert_eq!(record.cpu.user_pct, 8.00);
        assert_eq!(record.cpu.system_pct, 2.00);
        assert_eq!(record.cpu.total_pct, 10.00);
        assert_eq!(record.cpu.wait_pct, 0.0, "legacy layout has no wait column");
        // Offsets 9/10 per the legacy report shape.
        assert_eq!(record.disk.read_kb_per_sec, 32.00);
        assert_eq!(record.disk.write_kb_per_sec, 16.00);
        assert_eq!(record.name, "|__loader");
    }

    #[test]
    fn test_short_row_is_skipped() {
        let mut registry = ThreadRegistry::new();
        apply_block(
            &mut registry,
            &block(&["1754550000 1000 - 5678 12.00"]),
            ColumnLayout::Current,
        );

        assert!(registry.is_empty());
    }

    #[test]
    fn test_negative_or_non_integer_tid_is_skipped() {
        let bad_tid = "1754550000  1000  -  -5678   12.00  3.00  0.00  1.50  16.50  2  128.00  64.00  0.00  0  |__worker";
        let mut registry = ThreadRegistry::new();
        apply_block(&mut registry, &block(&[bad_tid]), ColumnLayout::Current);

        assert!(registry.is_empty(), "tid must be a plain digit run");
    }

    #[test]
    fn test_unparsable_float_reads_as_zero() {
        let row = "1754550000  1000  -  5678   12.00  3.00  N/A  1.50  16.50  2  128.00  64.00  0.00  0  |__worker";
        let mut registry = ThreadRegistry::new();
        apply_block(&mut registry, &block(&[row]), ColumnLayout::Current);

        let record = registry.get(5678).unwrap();
        assert_eq!(record.cpu.guest_pct, 0.0);
        assert_eq!(record.cpu.total_pct, 16.50, "other fields unaffected");
    }

    #[test]
    fn test_second_block_overwrites_samples_wholesale() {
        let mut registry = ThreadRegistry::new();
        apply_block(&mut registry, &block(&[CURRENT_ROW]), ColumnLayout::Current);

        let updated = "1754550001  1000  -  5678   1.00  0.50  0.00  0.00  1.50  7  0.00  0.00  0.00  0  |__worker";
        apply_block(&mut registry, &block(&[updated]), ColumnLayout::Current);

        let record = registry.get(5678).unwrap();
        assert_eq!(record.cpu.total_pct, 1.50);
        assert_eq!(record.cpu.core_id, "7");
        assert_eq!(record.disk.read_kb_per_sec, 0.0);
        assert_eq!(registry.len(), 1, "same tid, same record");
    }
}

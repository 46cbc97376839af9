//! Tone scales and numeric formatting for the rendered view.
//!
//! The boundaries are display configuration, not data: CPU percentages and
//! disk rates share one three-tier scale, run-queue latency has its own
//! nanosecond scale.

use crate::text::Tone;

/// CPU percentage tiers: under 20 ok, under 60 warn, beyond critical.
#[must_use]
pub fn cpu_tone(value: f64) -> Tone {
    if value < 20.0 {
        Tone::Ok
    } else if value < 60.0 {
        Tone::Warn
    } else {
        Tone::Critical
    }
}

/// Disk rate tiers (kB/s), same boundaries as the CPU scale.
#[must_use]
pub fn io_tone(value: f64) -> Tone {
    if value < 20.0 {
        Tone::Ok
    } else if value < 60.0 {
        Tone::Warn
    } else {
        Tone::Critical
    }
}

/// Run-queue latency tiers: under 10 microseconds ok, under 1 millisecond
/// warn, beyond critical.
#[must_use]
pub fn latency_tone(nanos: i64) -> Tone {
    if nanos < 10_000 {
        Tone::Ok
    } else if nanos < 1_000_000 {
        Tone::Warn
    } else {
        Tone::Critical
    }
}

/// Formats a (possibly negative) nanosecond count with a unit ladder:
/// nanos, micros, millis, then seconds.
#[must_use]
pub fn format_nanos(nanos: i64) -> String {
    let mut value = nanos as f64;
    for unit in [" nanos", " micros", " millis"] {
        if value.abs() < 1000.0 {
            return format!("{value:3.1}{unit}");
        }
        value /= 1000.0;
    }
    format!("{value:.1} seconds")
}

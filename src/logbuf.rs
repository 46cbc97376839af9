//! Deferred execution log.
//!
//! While the full-screen view owns the terminal, nothing can be printed to
//! stdout without corrupting the display, so log records accumulate in
//! memory and are flushed to the restored terminal when the process exits.
//! Installed once at startup through the `log` facade; every component logs
//! through `log::info!`/`log::debug!` as usual.

use std::sync::{Mutex, PoisonError};

use chrono::Local;
use log::{LevelFilter, Metadata, Record};

static ENTRIES: Mutex<Vec<String>> = Mutex::new(Vec::new());
static LOGGER: BufferedLogger = BufferedLogger;

struct BufferedLogger;

impl log::Log for BufferedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = format!(
            "{} | {} | {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
        let mut entries = ENTRIES.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry);
    }

    fn flush(&self) {}
}

/// Installs the buffering logger. `debug` keeps debug-level records,
/// otherwise only info and above are retained. Safe to call more than once;
/// only the first call installs.
pub fn init(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Takes every buffered entry, oldest first, leaving the buffer empty.
#[must_use]
pub fn drain() -> Vec<String> {
    let mut entries = ENTRIES.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *entries)
}

//! Minimal stderr logger for the CLI and examples.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::str::FromStr;

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger with the given maximum level.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Parse `off|error|warn|info|debug|trace` (case-insensitive).
pub fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s.trim())
        .map_err(|_| format!("invalid log level '{s}', expected off|error|warn|info|debug|trace"))
}

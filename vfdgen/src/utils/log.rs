// SPDX-License-Identifier: MIT

use log::{LevelFilter, Metadata, Record};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

struct CliLogger;

static LOGGER: CliLogger = CliLogger;

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[vfdgen] {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the CLI logger. Library crates log through the `log` facade;
/// the chosen level decides how much of it reaches the terminal.
pub fn init(level: LogLevel) {
    let filter = match level {
        LogLevel::Quiet => LevelFilter::Warn,
        LogLevel::Normal => LevelFilter::Info,
        LogLevel::Verbose => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(filter);
    }
}

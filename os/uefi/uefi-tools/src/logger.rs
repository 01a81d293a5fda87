//! Console logger for the shell tools.
//!
//! Records are printed as `[LEVEL] target: message`. The level starts at
//! `Info`; `-v` raises it to `Debug` through [`set_verbose`].

use alloc::boxed::Box;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct UefiLogger;

impl UefiLogger {
    /// Call this once, first thing in `main`.
    ///
    /// # Errors
    /// If a logger was already installed.
    pub fn init() -> Result<(), SetLoggerError> {
        log::set_logger(Box::leak(Box::new(Self)))?;
        log::set_max_level(LevelFilter::Info);
        Ok(())
    }
}

/// Enables debug output.
pub fn set_verbose() {
    log::set_max_level(LevelFilter::Debug);
}

impl Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        uefi::println!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        // Console output is unbuffered.
    }
}

use super::console_logger::init_console_logger;
use crate::domains::logger::{DomainLogger, DynLogger, FileLogger};
use std::sync::Arc;

/// Sends each line to the file log and to the console bridge.
struct Tee {
    file: FileLogger,
    console: DynLogger,
}

impl DomainLogger for Tee {
    fn info(&self, msg: &str) {
        self.file.info(msg);
        self.console.info(msg);
    }

    fn warn(&self, msg: &str) {
        self.file.warn(msg);
        self.console.warn(msg);
    }

    fn error(&self, msg: &str) {
        self.file.error(msg);
        self.console.error(msg);
    }
}

/// Initialize `fast_log` at `path` and return a logger writing to it.
pub fn init_file_logger(path: &str) -> anyhow::Result<DynLogger> {
    Ok(Arc::new(Tee {
        file: FileLogger::init(path, "tracking")?,
        console: init_console_logger(),
    }))
}

/// File logger when `path` is set and usable, otherwise the console bridge.
pub fn init_configured_logger(path: Option<&str>) -> DynLogger {
    match path.map(init_file_logger) {
        Some(Ok(logger)) => logger,
        Some(Err(e)) => {
            tracing::warn!(error = %format!("{:#}", e), "falling back to console logging");
            init_console_logger()
        }
        None => init_console_logger(),
    }
}

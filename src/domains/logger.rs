use anyhow::Context;
use chrono::{DateTime, Utc};
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Logging port for the tracking components.
/// Non-fallible: a component that logs never has to handle a logging failure.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Line layout shared by every file-backed logger: `<rfc3339> [<component>] <msg>`.
pub fn format_line(at: DateTime<Utc>, component: &str, msg: &str) -> String {
    format!("{} [{}] {}", at.to_rfc3339(), component, msg)
}

/// Writes tracking log lines to a file through `fast_log`, tagged with the
/// component that produced them.
///
/// `fast_log` owns the global `log` logger, so the binary installs its
/// `tracing` subscriber without the `log` bridge.
pub struct FileLogger {
    component: &'static str,
}

impl FileLogger {
    pub fn init(path: &str, component: &'static str) -> anyhow::Result<Self> {
        fast_log::init(
            fast_log::config::Config::new()
                .file(path)
                .level(log::LevelFilter::Info),
        )
        .with_context(|| format!("fast_log could not open {}", path))?;
        Ok(Self { component })
    }

    fn line(&self, msg: &str) -> String {
        format_line(Utc::now(), self.component, msg)
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{}", self.line(msg));
    }

    fn warn(&self, msg: &str) {
        log_warn!("{}", self.line(msg));
    }

    fn error(&self, msg: &str) {
        log_error!("{}", self.line(msg));
    }
}

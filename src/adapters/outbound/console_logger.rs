use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

/// Forwards domain log lines to the `tracing` subscriber installed by the binary.
struct TracingBridge {
    component: &'static str,
}

impl DomainLogger for TracingBridge {
    fn info(&self, msg: &str) {
        tracing::info!(component = self.component, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(component = self.component, "{}", msg);
    }

    fn error(&self, msg: &str) {
        tracing::error!(component = self.component, "{}", msg);
    }
}

/// Console-backed logger; output format and filtering follow the active subscriber.
pub fn init_console_logger() -> DynLogger {
    init_component_logger("tracking")
}

pub fn init_component_logger(component: &'static str) -> DynLogger {
    Arc::new(TracingBridge { component })
}

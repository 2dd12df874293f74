use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;
use tokio::sync::mpsc;

enum Level {
    Info,
    Warn,
    Error,
}

struct LogLine {
    level: Level,
    msg: String,
}

struct BufferedLogger {
    sender: mpsc::Sender<LogLine>,
}

impl BufferedLogger {
    fn push(&self, level: Level, msg: &str) {
        // never block a transport callback; drop on full
        let _ = self.sender.try_send(LogLine { level, msg: msg.to_string() });
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

/// Non-blocking logger for hot paths such as channel callbacks. Lines are
/// forwarded to `sink` from a background task; `capacity` bounds the queue.
/// Must be called inside a tokio runtime.
pub fn init_buffered_logger(sink: DynLogger, capacity: usize) -> DynLogger {
    let (tx, mut rx) = mpsc::channel::<LogLine>(capacity.max(1));

    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            match line.level {
                Level::Info => sink.info(&line.msg),
                Level::Warn => sink.warn(&line.msg),
                Level::Error => sink.error(&line.msg),
            }
        }
    });

    Arc::new(BufferedLogger { sender: tx })
}

use super::ports::MapSurface;
use crate::common::normalize_heading;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Polls the surface's camera heading every frame while the user pans or rotates the map.
///
/// At most one polling loop runs at a time. `stop` is idempotent and also runs on drop.
pub struct BearingPoller {
    map: Arc<dyn MapSurface>,
    interval: Duration,
    polling: Arc<AtomicBool>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    bearing: Arc<watch::Sender<f64>>,
}

impl BearingPoller {
    pub fn new(map: Arc<dyn MapSurface>, interval: Duration) -> Self {
        let (bearing, _) = watch::channel(0.0);
        Self {
            map,
            interval,
            polling: Arc::new(AtomicBool::new(false)),
            cancel: None,
            handle: None,
            bearing: Arc::new(bearing),
        }
    }

    /// Returns `false` when a loop is already running.
    pub fn start(&mut self) -> bool {
        if self.polling.swap(true, Ordering::SeqCst) {
            return false;
        }

        let token = CancellationToken::new();
        let map = self.map.clone();
        let polling = self.polling.clone();
        let bearing = self.bearing.clone();
        let interval = self.interval;
        let cancel = token.clone();

        self.handle = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = map.get_camera() => match result {
                        Ok(camera) if camera.heading.is_finite() => {
                            bearing.send_replace(normalize_heading(camera.heading));
                        }
                        Ok(_) => {}
                        Err(e) => tracing::trace!(error = %e, "camera not available for bearing poll"),
                    }
                }

                if !polling.load(Ordering::SeqCst) {
                    break;
                }
            }
        }));
        self.cancel = Some(token);
        true
    }

    pub fn stop(&mut self) {
        self.polling.store(false, Ordering::SeqCst);
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    /// Latest polled map bearing in `[0, 360)`.
    pub fn bearing(&self) -> f64 {
        *self.bearing.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.bearing.subscribe()
    }
}

impl Drop for BearingPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

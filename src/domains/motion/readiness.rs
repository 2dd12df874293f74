use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    /// Artwork still loading; a placeholder is drawn.
    Loading,
    /// Artwork arrived; waiting out a possible loading→ready flicker.
    Settling { since: Instant },
    Ready,
}

/// Tracks marker artwork readiness and decides whether the native marker
/// must keep re-rendering on every view change.
#[derive(Debug, Clone)]
pub struct MarkerReadiness {
    phase: ImagePhase,
    settle_delay: Duration,
    overlay_resizable: bool,
}

impl MarkerReadiness {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            phase: ImagePhase::Loading,
            settle_delay,
            overlay_resizable: false,
        }
    }

    pub fn phase(&self) -> ImagePhase {
        self.phase
    }

    /// Called when the image finished loading, or failed and fell back.
    pub fn image_loaded(&mut self, now: Instant) {
        if self.phase == ImagePhase::Loading {
            self.phase = ImagePhase::Settling { since: now };
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if let ImagePhase::Settling { since } = self.phase {
            if now.saturating_duration_since(since) >= self.settle_delay {
                self.phase = ImagePhase::Ready;
            }
        }
    }

    /// Child content that can change size needs view tracking back on.
    pub fn set_overlay_resizable(&mut self, resizable: bool) {
        self.overlay_resizable = resizable;
    }

    pub fn shows_placeholder(&self) -> bool {
        self.phase == ImagePhase::Loading
    }

    pub fn tracks_view_changes(&self) -> bool {
        self.phase != ImagePhase::Ready || self.overlay_resizable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_tracking_turns_off_after_settle() {
        let t0 = Instant::now();
        let mut readiness = MarkerReadiness::new(Duration::from_millis(250));
        assert!(readiness.shows_placeholder());
        assert!(readiness.tracks_view_changes());

        readiness.image_loaded(t0);
        assert!(!readiness.shows_placeholder());
        readiness.tick(t0 + Duration::from_millis(100));
        assert!(readiness.tracks_view_changes());

        readiness.tick(t0 + Duration::from_millis(250));
        assert_eq!(readiness.phase(), ImagePhase::Ready);
        assert!(!readiness.tracks_view_changes());

        readiness.set_overlay_resizable(true);
        assert!(readiness.tracks_view_changes());
    }

    #[test]
    fn test_repeated_load_does_not_restart_settle() {
        let t0 = Instant::now();
        let mut readiness = MarkerReadiness::new(Duration::from_millis(250));
        readiness.image_loaded(t0);
        readiness.image_loaded(t0 + Duration::from_millis(200));
        readiness.tick(t0 + Duration::from_millis(260));
        assert_eq!(readiness.phase(), ImagePhase::Ready);
    }
}

use super::pipeline::{DispatchReport, TrackingPipeline};
use crate::common::{ApplicationError, ApplicationResult, Coordinate, Region};
use crate::config::Config;
use crate::domains::buffer::{EventBuffer, SharedEventBuffer};
use crate::domains::camera::{BearingPoller, Camera, CameraFollowController, MapSurface};
use crate::domains::logger::DynLogger;
use crate::domains::motion::{MarkerFrame, TrackingMarker};
use crate::domains::subscription::{ChannelTransport, FocusOutcome, MovementObservers, SubscriptionManager};
use crate::domains::tracking::TrackedEntity;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Loads the layered configuration for a session host.
pub fn load_config(path: Option<&str>) -> ApplicationResult<Config> {
    Ok(Config::load_layered(path)?)
}

/// Waits for the next marker frame published by a running session.
pub async fn next_frame(frames: &mut watch::Receiver<MarkerFrame>) -> ApplicationResult<MarkerFrame> {
    frames
        .changed()
        .await
        .map_err(|_| ApplicationError::ChannelClosed("marker frames".to_string()))?;
    Ok(*frames.borrow_and_update())
}

/// Outbound collaborators of a session.
#[derive(Clone)]
pub struct SessionPorts {
    pub transport: Arc<dyn ChannelTransport>,
    pub map: Arc<dyn MapSurface>,
    pub logger: DynLogger,
}

#[derive(Clone, Default)]
pub struct SessionOptions {
    /// Fixed point kept in view next to the entity (dual framing).
    pub destination: Option<Coordinate>,
    pub observers: MovementObservers,
    pub rotate_with_heading: bool,
}

struct FrameLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FrameLoop {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Flushes one window and dispatches it. The buffer is not flushed again
/// until every delivery of this window has been dispatched.
async fn run_frame(
    buffer: &SharedEventBuffer,
    pipeline: &Mutex<TrackingPipeline>,
    frames: &watch::Sender<MarkerFrame>,
    now: Instant,
) -> Vec<DispatchReport> {
    let deliveries = match buffer.lock() {
        Ok(mut buffer) => buffer.flush(),
        Err(_) => Vec::new(),
    };

    let mut pipeline = pipeline.lock().await;
    let mut reports = Vec::with_capacity(deliveries.len());
    for delivery in deliveries {
        reports.push(pipeline.dispatch(now, delivery).await);
    }
    frames.send_replace(pipeline.frame(now));
    reports
}

/// Live tracking of one entity on one screen.
///
/// While focused, channel payloads flow subscription -> buffer -> pipeline on
/// the frame clock and the latest marker frame is published on a watch channel.
pub struct TrackingSession {
    config: Config,
    buffer: SharedEventBuffer,
    subscription: SubscriptionManager,
    pipeline: Arc<Mutex<TrackingPipeline>>,
    bearing: BearingPoller,
    frames: Arc<watch::Sender<MarkerFrame>>,
    frame_loop: Option<FrameLoop>,
    logger: DynLogger,
}

impl TrackingSession {
    pub fn new(entity: TrackedEntity, config: Config, ports: SessionPorts, options: SessionOptions) -> Self {
        let now = Instant::now();
        let buffer = EventBuffer::shared();
        let channel = entity.channel_name(&config.channel);

        let subscription = SubscriptionManager::new(ports.transport, buffer.clone(), ports.logger.clone(), channel);

        let mut camera = CameraFollowController::new(ports.map.clone(), config.camera.clone())
            .with_destination(options.destination);
        camera.set_rotate_with_heading(options.rotate_with_heading);

        let mut marker = TrackingMarker::new(entity, config.motion.clone(), now);
        let (frames, _) = watch::channel(marker.frame(now));

        Self {
            bearing: BearingPoller::new(ports.map, config.camera.bearing_poll_interval()),
            pipeline: Arc::new(Mutex::new(TrackingPipeline::new(marker, camera, options.observers))),
            frames: Arc::new(frames),
            frame_loop: None,
            logger: ports.logger,
            subscription,
            buffer,
            config,
        }
    }

    pub fn channel(&self) -> &str {
        self.subscription.channel()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_subscribed()
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.is_some()
    }

    pub fn buffer(&self) -> SharedEventBuffer {
        self.buffer.clone()
    }

    pub fn pipeline(&self) -> Arc<Mutex<TrackingPipeline>> {
        self.pipeline.clone()
    }

    /// Opens the channel subscription and starts the frame clock.
    pub async fn focus_gained(&mut self) -> FocusOutcome {
        let outcome = self.subscription.focus_gained().await;
        if outcome != FocusOutcome::Failed && self.frame_loop.is_none() {
            self.frame_loop = Some(self.spawn_frame_loop());
        }
        outcome
    }

    /// Closes the subscription, stops polling and the frame clock, and drops
    /// undelivered events. Safe to repeat.
    pub async fn focus_lost(&mut self) {
        self.subscription.focus_lost();
        self.bearing.stop();
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
        }
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear_events();
        }
        self.pipeline.lock().await.marker_mut().reset_motion_history();
    }

    /// Flushes the buffer and dispatches every delivery at `now`. Used when no
    /// frame clock is running, e.g. by a host that drives its own frames.
    pub async fn tick(&self, now: Instant) -> Vec<DispatchReport> {
        run_frame(&self.buffer, &self.pipeline, &self.frames, now).await
    }

    /// The user started dragging or rotating the map.
    pub fn pan_began(&mut self) -> bool {
        self.bearing.start()
    }

    /// The gesture settled; `camera` is the surface's camera if it could be read.
    pub async fn pan_ended(&mut self, camera: Option<Camera>, region: Region) {
        self.bearing.stop();
        let mut pipeline = self.pipeline.lock().await;
        let was_following = pipeline.camera().is_following();
        pipeline.camera_mut().on_region_change_complete(camera, region);
        if was_following && !pipeline.camera().is_following() {
            self.logger
                .info(&format!("Follow paused on {} after zoom out", self.subscription.channel()));
        }
    }

    pub async fn resume_follow(&self) {
        self.pipeline.lock().await.camera_mut().resume_follow();
    }

    pub fn is_bearing_polling(&self) -> bool {
        self.bearing.is_polling()
    }

    pub fn bearing(&self) -> f64 {
        self.bearing.bearing()
    }

    pub fn bearing_updates(&self) -> watch::Receiver<f64> {
        self.bearing.subscribe()
    }

    pub async fn image_loaded(&self, now: Instant) {
        self.pipeline.lock().await.marker_mut().readiness_mut().image_loaded(now);
    }

    pub fn frames(&self) -> watch::Receiver<MarkerFrame> {
        self.frames.subscribe()
    }

    pub fn latest_frame(&self) -> MarkerFrame {
        *self.frames.borrow()
    }

    pub async fn entity(&self) -> TrackedEntity {
        self.pipeline.lock().await.marker().entity().clone()
    }

    pub async fn shutdown(&mut self) {
        self.focus_lost().await;
        self.logger
            .info(&format!("Tracking session for {} shut down", self.subscription.channel()));
    }

    /// One task owns the frame clock. A slow map write delays the next flush,
    /// so events that arrive meanwhile coalesce in the buffer instead of queueing.
    fn spawn_frame_loop(&self) -> FrameLoop {
        let interval = self.config.buffer.flush_interval();
        let cancel = CancellationToken::new();
        let buffer = self.buffer.clone();
        let pipeline = self.pipeline.clone();
        let frames = self.frames.clone();
        let stop = cancel.clone();

        let task = tokio::spawn(async move {
            let mut clock = tokio::time::interval(interval);
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = clock.tick() => {
                        run_frame(&buffer, &pipeline, &frames, Instant::now()).await;
                    }
                }
            }
        });

        FrameLoop { cancel, task }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if let Some(frame_loop) = self.frame_loop.take() {
            frame_loop.stop();
        }
    }
}

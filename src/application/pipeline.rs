use crate::domains::buffer::BufferedEvent;
use crate::domains::camera::{CameraFollowController, FollowDecision};
use crate::domains::motion::{MarkerFrame, MotionCommand, TrackingMarker};
use crate::domains::subscription::{MovementNotice, MovementObservers};
use tokio::time::Instant;

/// What one dispatch did; returned for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub stream_id: String,
    pub commands: Vec<MotionCommand>,
    /// `None` when the delivery carried no coordinate.
    pub follow: Option<FollowDecision>,
}

/// Delivered event -> motion commands -> observers -> camera follow.
pub struct TrackingPipeline {
    marker: TrackingMarker,
    camera: CameraFollowController,
    observers: MovementObservers,
}

impl TrackingPipeline {
    pub fn new(marker: TrackingMarker, camera: CameraFollowController, observers: MovementObservers) -> Self {
        Self {
            marker,
            camera,
            observers,
        }
    }

    pub async fn dispatch(&mut self, now: Instant, event: BufferedEvent) -> DispatchReport {
        let commands = self.marker.plan(&event);
        let duration = commands.iter().find_map(|command| match command {
            MotionCommand::Move { duration, .. } => *duration,
            MotionCommand::Rotate { .. } => None,
        });

        for command in &commands {
            self.marker.apply(now, *command);
        }

        self.observers.notify(&MovementNotice {
            coordinates: event.coordinate,
            heading: event.heading,
            duration,
            data: event.data.clone(),
        });

        let follow = match event.coordinate {
            Some(coordinate) => {
                let heading = Some(self.marker.entity().heading);
                Some(self.camera.on_movement(now, coordinate, heading).await)
            }
            None => None,
        };

        tracing::trace!(
            stream = %event.stream_id,
            coalesced = event.coalesced,
            follow = ?follow,
            "dispatched movement"
        );

        DispatchReport {
            stream_id: event.stream_id,
            commands,
            follow,
        }
    }

    pub fn frame(&mut self, now: Instant) -> MarkerFrame {
        self.marker.frame(now)
    }

    pub fn marker(&self) -> &TrackingMarker {
        &self.marker
    }

    pub fn marker_mut(&mut self) -> &mut TrackingMarker {
        &mut self.marker
    }

    pub fn camera(&self) -> &CameraFollowController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraFollowController {
        &mut self.camera
    }
}

//! Liveness watchdog
//!
//! Paired with one stream reader. Every line the reader sees arrives here as
//! a pulse; when no pulse arrives within the timeout a `watchdog/lost-signal`
//! event is raised, and raised again each timeout after that with a growing
//! count. Rate limiting is left to the dampener.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crate::camera::{Camera, CameraId};
use crate::event::Event;

pub struct Watchdog {
    id: CameraId,
    camera: Arc<Camera>,
    timeout: Duration,
    pulses: Receiver<()>,
    events: Sender<Event>,
    count: i64,
}

impl Watchdog {
    pub fn new(
        id: CameraId,
        camera: Arc<Camera>,
        timeout: Duration,
        pulses: Receiver<()>,
        events: Sender<Event>,
    ) -> Self {
        Self {
            id,
            camera,
            timeout,
            pulses,
            events,
            count: 1,
        }
    }

    pub fn run(mut self) {
        while self.wait_once().is_continue() {}
        log::debug!("Watchdog for {} stopping", self.camera.display_name());
    }

    /// Wait for one pulse or one timeout
    pub fn wait_once(&mut self) -> ControlFlow<()> {
        match self.pulses.recv_timeout(self.timeout) {
            Ok(()) => ControlFlow::Continue(()),
            Err(RecvTimeoutError::Timeout) => {
                let event = Event::lost_signal(self.id, self.count);
                log::warn!(
                    "Camera {}: no data for {}s ({})",
                    self.camera.display_name(),
                    self.timeout.as_secs(),
                    event
                );
                if self.events.send(event).is_err() {
                    return ControlFlow::Break(());
                }
                self.count += 1;
                ControlFlow::Continue(())
            }
            Err(RecvTimeoutError::Disconnected) => ControlFlow::Break(()),
        }
    }
}

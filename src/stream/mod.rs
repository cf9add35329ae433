//! Per-camera stream reader
//!
//! A reader owns one camera connection. It reconnects forever with a fixed
//! spacing between attempts, pulses its watchdog on every line, and forwards
//! each completed event into the shared fan-in channel.

pub mod parser;
pub mod transport;

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use std::io::BufRead;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crate::camera::{Camera, CameraId};
use crate::clock::{self, Clock};
use crate::event::Event;

pub use transport::{HttpTransport, Transport};

pub struct StreamReader {
    id: CameraId,
    camera: Arc<Camera>,
    retry_interval: Duration,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: Sender<Event>,
    pulses: Sender<()>,
    pending: Event,
    last_attempt: Option<DateTime<Utc>>,
}

impl StreamReader {
    pub fn new(
        id: CameraId,
        camera: Arc<Camera>,
        retry_interval: Duration,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        events: Sender<Event>,
        pulses: Sender<()>,
    ) -> Self {
        Self {
            id,
            camera,
            retry_interval,
            transport,
            clock,
            events,
            pulses,
            pending: Event::new(id),
            last_attempt: None,
        }
    }

    /// Read until the pipeline shuts down, reconnecting on every failure
    pub fn run(mut self) {
        while self.connect_cycle().is_continue() {}
        log::debug!("Reader for {} stopping: pipeline closed", self.camera.display_name());
    }

    /// One connection attempt and, if it succeeds, the stream it yields
    ///
    /// Breaks only when the fan-in channel or the paired watchdog is gone.
    pub fn connect_cycle(&mut self) -> ControlFlow<()> {
        self.wait_for_retry_window();
        self.last_attempt = Some(self.clock.now());

        match self.transport.open(&self.camera) {
            Ok(body) => self.consume(body),
            Err(e) => {
                log::warn!("Camera {}: {:#}", self.camera.display_name(), e);
                ControlFlow::Continue(())
            }
        }
    }

    /// Sleep out whatever is left of the retry interval since the last attempt
    fn wait_for_retry_window(&self) {
        let Some(last) = self.last_attempt else {
            return;
        };
        let next = last
            .checked_add_signed(clock::delta(self.retry_interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let now = self.clock.now();
        if now < next {
            let remaining = (next - now).to_std().unwrap_or(self.retry_interval);
            log::info!(
                "Camera {}: waiting {:.1}s before reconnecting",
                self.camera.display_name(),
                remaining.as_secs_f64()
            );
            self.clock.sleep(remaining);
        }
    }

    fn consume(&mut self, mut body: Box<dyn BufRead + Send>) -> ControlFlow<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match body.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    log::warn!("Camera {}: stream closed by remote", self.camera.display_name());
                    return ControlFlow::Continue(());
                }
                Ok(_) if buf.last() != Some(&b'\n') => {
                    log::warn!(
                        "Camera {}: stream closed mid-line, dropping {} bytes",
                        self.camera.display_name(),
                        buf.len()
                    );
                    return ControlFlow::Continue(());
                }
                Ok(_) => {
                    if self.pulses.send(()).is_err() {
                        return ControlFlow::Break(());
                    }
                    let line = String::from_utf8_lossy(&buf);
                    if self.handle_line(&line).is_break() {
                        return ControlFlow::Break(());
                    }
                }
                Err(e) => {
                    log::warn!("Camera {}: read error: {}", self.camera.display_name(), e);
                    return ControlFlow::Continue(());
                }
            }
        }
    }

    /// Feed one line into the accumulator, forwarding the event once complete
    pub fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        log::trace!("{} <- {}", self.camera.display_name(), parser::trim_line(line));

        parser::apply_line(&mut self.pending, line);
        if !self.pending.is_complete() {
            return ControlFlow::Continue(());
        }

        let event = self.pending.clone();
        self.pending.reset();
        if event.is_video_loss() {
            log::debug!("Camera {}: dropping {}", self.camera.display_name(), event);
            return ControlFlow::Continue(());
        }

        log::debug!("Camera {}: {}", self.camera.display_name(), event);
        match self.events.send(event) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }
}

//! Pipeline wiring
//!
//! Each camera gets a reader thread and a watchdog thread joined by a
//! rendezvous pulse channel. Both publish into one unbounded fan-in channel,
//! which the dispatcher drains on the calling thread. Producers never wait
//! on a slow notifier.

use crossbeam_channel::{bounded, unbounded};
use eyre::{Context, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::camera::{Camera, CameraId};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dampener::Dispatcher;
use crate::notifier::{AutomationNotifier, Notifier};
use crate::stream::{HttpTransport, StreamReader, Transport};
use crate::watchdog::Watchdog;

/// Run the pipeline against real cameras; returns only if every producer stops
pub fn run(config: &Config) -> Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = Box::new(AutomationNotifier::new(config.automation.clone()));
    run_with(config, transport, clock, notifier)
}

pub fn run_with(
    config: &Config,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
) -> Result<()> {
    let cameras: Vec<Arc<Camera>> = config.cameras.iter().cloned().map(Arc::new).collect();
    let (event_tx, event_rx) = unbounded();
    let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(cameras.len() * 2);

    for (index, camera) in cameras.iter().enumerate() {
        let id = CameraId::new(index);
        let (pulse_tx, pulse_rx) = bounded(0);

        let watchdog = Watchdog::new(
            id,
            Arc::clone(camera),
            config.timing.watchdog_timeout(),
            pulse_rx,
            event_tx.clone(),
        );
        let reader = StreamReader::new(
            id,
            Arc::clone(camera),
            config.timing.error_retry_interval(),
            Arc::clone(&transport),
            Arc::clone(&clock),
            event_tx.clone(),
            pulse_tx,
        );

        handles.push(
            thread::Builder::new()
                .name(format!("watchdog-{}", index))
                .spawn(move || watchdog.run())
                .context("Failed to spawn watchdog thread")?,
        );
        handles.push(
            thread::Builder::new()
                .name(format!("reader-{}", index))
                .spawn(move || reader.run())
                .context("Failed to spawn reader thread")?,
        );

        log::info!("Listening to camera {} at {}", camera.display_name(), camera.url);
    }
    drop(event_tx);

    Dispatcher::new(config.timing.dampening_window(), notifier, clock, cameras).run(event_rx);

    for handle in handles {
        let name = handle.thread().name().unwrap_or("worker").to_string();
        if handle.join().is_err() {
            log::error!("Thread {} panicked", name);
        }
    }
    Ok(())
}

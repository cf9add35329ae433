//! Event dampening and dispatch
//!
//! The dispatcher is the only consumer of the fan-in channel and the only
//! owner of the dampening table, so the table needs no lock. The window
//! slides: every occurrence of a key refreshes its timestamp, whether or not
//! it was dispatched, so a key fires again only after a full quiet window.

use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::camera::{Camera, CameraId};
use crate::clock::{self, Clock};
use crate::event::Event;
use crate::notifier::Notifier;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DampKey {
    pub event_type: String,
    pub source: CameraId,
}

impl DampKey {
    pub fn of(event: &Event) -> Self {
        Self {
            event_type: event.event_type.clone(),
            source: event.source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Dispatch,
    Dampened,
}

#[derive(Debug)]
pub struct Dampener {
    window: TimeDelta,
    last_seen: HashMap<DampKey, DateTime<Utc>>,
}

impl Dampener {
    pub fn new(window: Duration) -> Self {
        Self {
            window: clock::delta(window),
            last_seen: HashMap::new(),
        }
    }

    /// Record an occurrence at `now` and decide whether it may be dispatched
    pub fn observe(&mut self, key: DampKey, now: DateTime<Utc>) -> Verdict {
        let verdict = match self.last_seen.get(&key) {
            None => Verdict::Dispatch,
            Some(last) => match last.checked_add_signed(self.window) {
                Some(until) if now > until => Verdict::Dispatch,
                _ => Verdict::Dampened,
            },
        };
        self.last_seen.insert(key, now);
        verdict
    }

    #[cfg(test)]
    pub fn last_seen(&self, key: &DampKey) -> Option<DateTime<Utc>> {
        self.last_seen.get(key).copied()
    }

    /// Number of distinct keys seen so far
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }
}

/// Single consumer of the fan-in channel
pub struct Dispatcher {
    dampener: Dampener,
    notifier: Box<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cameras: Vec<Arc<Camera>>,
}

impl Dispatcher {
    pub fn new(
        window: Duration,
        notifier: Box<dyn Notifier>,
        clock: Arc<dyn Clock>,
        cameras: Vec<Arc<Camera>>,
    ) -> Self {
        Self {
            dampener: Dampener::new(window),
            notifier,
            clock,
            cameras,
        }
    }

    /// Consume events until every producer has gone away
    pub fn run(mut self, events: Receiver<Event>) {
        for event in events.iter() {
            self.dispatch(event);
        }
        log::info!("All event producers stopped, dispatcher exiting");
    }

    pub fn dispatch(&mut self, event: Event) -> Verdict {
        let now = self.clock.now();
        let key = DampKey::of(&event);
        let camera_name = self
            .cameras
            .get(event.source.index())
            .map(|c| c.display_name())
            .unwrap_or("unknown");

        let verdict = self.dampener.observe(key, now);
        match verdict {
            Verdict::Dispatch => self.notifier.notify(&event, camera_name, now),
            Verdict::Dampened => log::info!("Time dampened {} from {}", event, camera_name),
        }
        verdict
    }

    #[cfg(test)]
    pub fn dampener(&self) -> &Dampener {
        &self.dampener
    }
}

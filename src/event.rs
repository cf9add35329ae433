//! Camera events
//!
//! An `Event` doubles as the parse accumulator for a stream: fields fill in as
//! markers arrive, and once `is_complete` holds the event is sent on and the
//! accumulator is reset for the next one.

use std::fmt;

use crate::camera::CameraId;

pub const LINE_DETECTION: &str = "linedetection";
pub const VIDEO_LOSS: &str = "videoloss";
pub const WATCHDOG: &str = "watchdog";

pub const ACTIVE: &str = "active";
pub const LOST_SIGNAL: &str = "lost-signal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: String,
    pub state: String,
    /// Source-supplied post count plus one; zero means "not seen yet"
    pub active_count: i64,
    pub source: CameraId,
}

impl Event {
    /// Empty accumulator for `source`
    pub fn new(source: CameraId) -> Self {
        Self {
            event_type: String::new(),
            state: String::new(),
            active_count: 0,
            source,
        }
    }

    /// Synthetic event raised when a source goes quiet
    pub fn lost_signal(source: CameraId, count: i64) -> Self {
        Self {
            event_type: WATCHDOG.to_string(),
            state: LOST_SIGNAL.to_string(),
            active_count: count,
            source,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.event_type.is_empty() && !self.state.is_empty() && self.active_count > 0
    }

    /// Clear all fields, keeping the source
    pub fn reset(&mut self) {
        *self = Self::new(self.source);
    }

    /// Video-loss events are dropped at the reader and never forwarded
    pub fn is_video_loss(&self) -> bool {
        self.event_type == VIDEO_LOSS
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (count {}) from {}",
            self.event_type, self.state, self.active_count, self.source
        )
    }
}

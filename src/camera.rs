//! Camera descriptors
//!
//! A camera is loaded once from config and never mutated. Events refer back to
//! their camera through a `CameraId`, the camera's position in the config list,
//! so two entries with identical fields are still two distinct sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One event-stream source
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Camera {
    /// Event stream URL
    #[serde(rename = "Url")]
    pub url: String,

    /// Display name used in log output
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Username", default)]
    pub username: String,

    #[serde(rename = "Password", default)]
    pub password: String,
}

impl Camera {
    /// Name for logs, falling back to the URL for unnamed cameras
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.url } else { &self.name }
    }

    /// Copy with the password masked, for printing
    pub fn redacted(&self) -> Self {
        Self {
            password: mask(&self.password),
            ..self.clone()
        }
    }
}

/// Stable identity of a configured camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(usize);

impl CameraId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera#{}", self.0)
    }
}

pub(crate) fn mask(secret: &str) -> String {
    if secret.is_empty() { String::new() } else { "********".to_string() }
}

//! Connection to a camera's alert stream

use eyre::{Context, Result};
use std::io::{BufRead, BufReader};

use crate::camera::Camera;
use crate::http;

/// Opens the long-lived event stream for a camera
pub trait Transport: Send + Sync {
    fn open(&self, camera: &Camera) -> Result<Box<dyn BufRead + Send>>;
}

/// Plain HTTP GET with basic auth
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { agent: http::agent() }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn open(&self, camera: &Camera) -> Result<Box<dyn BufRead + Send>> {
        let response = self
            .agent
            .get(&camera.url)
            .header("Authorization", &http::basic_auth(&camera.username, &camera.password))
            .call()
            .context(format!("Failed to connect to {}", camera.url))?;

        log::info!("Connected to {} (HTTP {})", camera.display_name(), response.status());

        Ok(Box::new(BufReader::new(response.into_body().into_reader())))
    }
}

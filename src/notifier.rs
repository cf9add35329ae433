//! Automation trigger
//!
//! Only an active line detection switches the automation device on. Every
//! other event reaching the notifier is ignored here; the dampener has
//! already recorded it either way.

use chrono::{DateTime, Local, Utc};
use eyre::{Context, Result};

use crate::config::AutomationConfig;
use crate::event::{ACTIVE, Event, LINE_DETECTION};
use crate::http;

pub trait Notifier: Send {
    /// Act on an event that survived dampening; failures are logged, not returned
    fn notify(&self, event: &Event, camera_name: &str, at: DateTime<Utc>);
}

/// Whether an event warrants switching the device on
pub fn wants_action(event: &Event) -> bool {
    event.event_type == LINE_DETECTION && event.state == ACTIVE
}

/// Domoticz-style JSON API endpoint
pub struct AutomationNotifier {
    config: AutomationConfig,
    agent: ureq::Agent,
}

impl AutomationNotifier {
    pub fn new(config: AutomationConfig) -> Self {
        Self {
            config,
            agent: http::agent(),
        }
    }

    fn switch_on(&self) -> Result<()> {
        let url = self.config.switch_on_url();
        log::debug!("GET {}", url);

        let mut request = self.agent.get(&url);
        if let Some((username, password)) = self.config.credentials() {
            request = request.header("Authorization", &http::basic_auth(username, password));
        }

        request
            .call()
            .context(format!("Failed to call automation endpoint {}", url))?;
        Ok(())
    }
}

impl Notifier for AutomationNotifier {
    fn notify(&self, event: &Event, camera_name: &str, at: DateTime<Utc>) {
        if !wants_action(event) {
            log::debug!("No action for {} from {}", event, camera_name);
            return;
        }

        let local = at.with_timezone(&Local);
        log::info!(
            "Sending notification for {} from {} at {}",
            event,
            camera_name,
            local.format("%Y-%m-%d %H:%M:%S")
        );

        if !self.config.is_configured() {
            log::warn!("No automation host configured, skipping switch command");
            return;
        }

        if let Err(e) = self.switch_on() {
            log::error!("{:#}", e);
        }
    }
}

use colored::*;
use eyre::Result;

use crate::config::Config;
use crate::pipeline;

pub fn run(config: &Config) -> Result<()> {
    println!(
        "{} hiknotify listening to {} camera(s)",
        "→".blue(),
        config.cameras.len().to_string().cyan()
    );

    log::info!(
        "Timing: dampening {}s, error retry {}s, watchdog {}s",
        config.timing.dampening_time,
        config.timing.error_retry_time,
        config.timing.watchdog_time
    );
    if !config.automation.is_configured() {
        log::warn!("No DomoticzHost configured; events will be logged but nothing is switched");
    }

    pipeline::run(config)
}

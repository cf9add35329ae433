use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    let config = config.redacted();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&config)?);
        }
        OutputFormat::Text => {
            println!("{}", "hiknotify Configuration".bold());
            println!();

            println!("{}:", "cameras".cyan());
            for (index, camera) in config.cameras.iter().enumerate() {
                println!("  [{}] {} {}", index, camera.display_name().bold(), camera.url.dimmed());
                if !camera.username.is_empty() {
                    println!("      user: {}", camera.username);
                }
            }
            println!();

            println!("{}:", "automation".cyan());
            if config.automation.is_configured() {
                println!("  host: {}", config.automation.host);
                println!("  port: {}", config.automation.port);
                println!("  index: {}", config.automation.index);
                println!("  basic_auth: {}", config.automation.basic_auth);
            } else {
                println!("  {} not configured", "⚠".yellow());
            }
            println!();

            println!("{}:", "timing".cyan());
            println!("  dampening_time: {}s", config.timing.dampening_time);
            println!("  error_retry_time: {}s", config.timing.error_retry_time);
            println!("  watchdog_time: {}s", config.timing.watchdog_time);
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "dampening_time" | "DampeningTime" => Some(config.timing.dampening_time.to_string()),
        "error_retry_time" | "ErrorRetryTime" => Some(config.timing.error_retry_time.to_string()),
        "watchdog_time" | "WatchdogTime" => Some(config.timing.watchdog_time.to_string()),
        "automation.host" | "DomoticzHost" => Some(config.automation.host.clone()),
        "automation.port" | "DomoticzPort" => Some(config.automation.port.clone()),
        "automation.index" | "LineCrossidx" => Some(config.automation.index.clone()),
        "automation.basic_auth" | "DomoticzBasicAuth" => Some(config.automation.basic_auth.to_string()),
        "cameras" => Some(
            config
                .cameras
                .iter()
                .map(|c| c.display_name())
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

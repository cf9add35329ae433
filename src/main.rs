use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;

mod camera;
mod cli;
mod clock;
mod commands;
mod config;
mod dampener;
mod event;
mod http;
mod notifier;
mod pipeline;
mod stream;
mod watchdog;

use cli::{Cli, Commands};
use config::{Config, LogLevel};

fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    // RUST_LOG env var takes precedence, then --verbose, then config log_level
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else if verbose {
        builder.filter_level(LogLevel::Debug.level_filter());
    } else {
        builder.filter_level(config.log_level.level_filter());
    }

    let destination = match config.log_file_path() {
        Some(log_file) => {
            if let Some(parent) = log_file.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let target = Box::new(
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
                    .context("Failed to open log file")?,
            );
            builder.target(env_logger::Target::Pipe(target));
            log_file.display().to_string()
        }
        None => {
            builder.target(env_logger::Target::Stderr);
            "stderr".to_string()
        }
    };

    builder.init();

    info!("Logging initialized, writing to: {}", destination);
    if std::env::var("RUST_LOG").is_ok() {
        info!("Log level from RUST_LOG env");
    } else if verbose {
        info!("Log level: debug (from --verbose)");
    } else {
        info!("Log level: {} (from config)", config.log_level.as_filter());
    }
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::TriggerUrl => commands::trigger::run(&config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Completions need no config
    if let Some(Commands::Completions { shell }) = &cli.command {
        return commands::completions::run(*shell);
    }

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config, cli.verbose).context("Failed to setup logging")?;

    info!("Starting hiknotify with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}

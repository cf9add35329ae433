use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "hiknotify",
    about = "Relay camera line-detection events to a home automation switch",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Config is read from --config, $HIKNOTIFY_CONFIG, ~/.config/hiknotify/config.json or ./config.json"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config.json (or .yaml)")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG is set")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Listen to all cameras and trigger the automation endpoint (default)
    Run,

    /// Inspect the loaded configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the URL called when a line detection fires
    TriggerUrl,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration, passwords masked
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a single configuration value
    Get {
        /// Key (e.g., dampening_time, automation.host)
        key: String,
    },
}

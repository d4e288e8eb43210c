use clap::{Args, Parser, Subcommand, ValueEnum};
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
    name = "expnotify",
    about = "Signal experiment lifecycle events to a local recording listener",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/expnotify/logs/expnotify.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to expnotify.yaml config file")]
    pub config: Option<PathBuf>,

    /// Listener URL, overrides the config file
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Experiment and stimulus ids; unset values fall back to the config
#[derive(Args, Debug, Clone, Default)]
pub struct Ids {
    /// Experiment id
    #[arg(short, long)]
    pub experiment_id: Option<String>,

    /// Stimulus id
    #[arg(short, long)]
    pub stimulus_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Signal that a stimulus started
    Start {
        #[command(flatten)]
        ids: Ids,
    },

    /// Signal that a stimulus ended
    Stop {
        #[command(flatten)]
        ids: Ids,
    },

    /// Ask the listener to flush recorded data for the experiment
    Save {
        /// Experiment id
        #[arg(short, long)]
        experiment_id: Option<String>,
    },

    /// Tell the listener to shut its devices down
    Terminate,

    /// Interactive control panel reading commands from stdin
    Console {
        #[command(flatten)]
        ids: Ids,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// New value
        value: String,
    },
}

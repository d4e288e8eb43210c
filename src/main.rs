use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;
mod config;
mod event;
mod notifier;
mod panel;

use cli::{Cli, Commands};
use config::{Config, LogLevel};
use event::EventType;

fn setup_logging(log_level: &LogLevel) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expnotify")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("expnotify.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(match log_level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        });
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Start { ids } => commands::send::run(EventType::Start, ids.experiment_id, ids.stimulus_id, &config),
        Commands::Stop { ids } => commands::send::run(EventType::Stop, ids.experiment_id, ids.stimulus_id, &config),
        Commands::Save { experiment_id } => commands::send::run(EventType::Save, experiment_id, None, &config),
        Commands::Terminate => commands::send::run(EventType::Terminate, None, None, &config),
        Commands::Console { ids } => commands::console::run(ids, &config),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before logging is up, so Config::load messages are dropped
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if let Some(endpoint) = &cli.endpoint {
        config::validate_endpoint(endpoint)?;
        config.endpoint = endpoint.clone();
    }

    setup_logging(&config.log_level).context("Failed to setup logging")?;

    info!("Starting expnotify with config from: {:?}, endpoint {}", cli.config, config.endpoint);

    run(cli, config).context("Command failed")?;

    Ok(())
}

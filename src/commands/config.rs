use colored::*;
use eyre::{Context, Result};
use std::fs;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, LogLevel, validate_endpoint};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
        ConfigAction::Set { key, value } => set(&key, &value, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "expnotify Configuration".bold());
            println!();
            println!("  {}: {}", "endpoint".cyan(), config.endpoint);
            println!("  {}: {}", "experiment_id".cyan(), config.experiment_id);
            println!("  {}: {}", "stimulus_id".cyan(), config.stimulus_id);
            println!("  {}: {}", "log_level".cyan(), config.log_level.as_filter());
            match config.timeout_secs {
                Some(secs) => println!("  {}: {}s", "timeout".cyan(), secs),
                None => println!("  {}: {}", "timeout".cyan(), "client default".dimmed()),
            }
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "endpoint" => Some(config.endpoint.clone()),
        "experiment_id" | "experiment-id" => Some(config.experiment_id.clone()),
        "stimulus_id" | "stimulus-id" => Some(config.stimulus_id.clone()),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        "timeout_secs" | "timeout-secs" => Some(config.timeout_secs.map(|s| s.to_string()).unwrap_or_default()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => {
            eprintln!("{} Unknown config key: {}", "✗".red(), key);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn apply(key: &str, value: &str, config: &mut Config) -> Result<()> {
    match key {
        "endpoint" => {
            validate_endpoint(value)?;
            config.endpoint = value.to_string();
        }
        "experiment_id" | "experiment-id" => config.experiment_id = value.to_string(),
        "stimulus_id" | "stimulus-id" => config.stimulus_id = value.to_string(),
        "log_level" | "log-level" => {
            config.log_level = LogLevel::from_str(value)
                .ok_or_else(|| eyre::eyre!("Invalid log level: {} (use trace, debug, info, warn, error or off)", value))?;
        }
        "timeout_secs" | "timeout-secs" => {
            config.timeout_secs = match value {
                "" | "none" => None,
                secs => Some(secs.parse().context("Invalid timeout (use whole seconds or 'none')")?),
            };
        }
        _ => {
            eyre::bail!("Unknown config key: {}", key);
        }
    }

    Ok(())
}

fn set(key: &str, value: &str, config: &Config) -> Result<()> {
    println!("{} Setting {} = {}", "→".blue(), key.cyan(), value.green());

    let mut new_config = config.clone();
    apply(key, value, &mut new_config)?;

    let config_path = Config::config_dir().join("expnotify.yaml");
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml_str = serde_yaml::to_string(&new_config).context("Failed to serialize config")?;
    fs::write(&config_path, yaml_str).context("Failed to write config file")?;

    println!("  {} Saved to {}", "✓".green(), config_path.display());

    Ok(())
}

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notifier::DEFAULT_ENDPOINT;

/// Main expnotify configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Listener URL every event is POSTed to
    pub endpoint: String,
    /// Experiment id used when none is given on the command line
    pub experiment_id: String,
    /// Stimulus id used when none is given on the command line
    pub stimulus_id: String,
    pub log_level: LogLevel,
    /// Overall request timeout; unset keeps the HTTP client default
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            experiment_id: "00".to_string(),
            stimulus_id: "10".to_string(),
            log_level: LogLevel::Info,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let path = Self::expand_path(path);
            return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
        }

        // Check EXPNOTIFY_CONFIG env var
        if let Ok(env_path) = std::env::var("EXPNOTIFY_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from EXPNOTIFY_CONFIG: {}", e);
                    }
                }
            }
        }

        // Try EXPNOTIFY_DIR/expnotify.yaml, then ~/.config/expnotify/expnotify.yaml
        let path = Self::config_dir().join("expnotify.yaml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        // Try ./expnotify.yaml (for development)
        let local_config = PathBuf::from("expnotify.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject endpoints the HTTP client cannot POST to
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Directory holding expnotify.yaml
    pub fn config_dir() -> PathBuf {
        std::env::var("EXPNOTIFY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("expnotify"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

/// The endpoint must be an absolute http(s) URL with a host
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let uri: ureq::http::Uri = endpoint
        .parse()
        .with_context(|| format!("Invalid endpoint URL: {} (expected http://host:port/)", endpoint))?;

    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => eyre::bail!("Invalid endpoint URL: {} (only http and https are supported, got {})", endpoint, other),
        None => eyre::bail!("Invalid endpoint URL: {} (missing scheme, expected http://host:port/)", endpoint),
    }

    if uri.host().is_none_or(str::is_empty) {
        eyre::bail!("Invalid endpoint URL: {} (missing host)", endpoint);
    }

    Ok(())
}

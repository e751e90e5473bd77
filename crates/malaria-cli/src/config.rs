//! Configuration file management.
//!
//! Settings are resolved in order: command-line flag, environment
//! variable (handled by clap), config file, built-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use malaria_core::{DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT};
use malaria_types::Language;
use serde::{Deserialize, Serialize};

use crate::cli::{ConfigKey, OutputFormat};

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "MALARIA_CONFIG";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the inference service
    #[serde(default)]
    pub service_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// History database file
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Save failed analyses as `error` records
    #[serde(default)]
    pub persist_failures: bool,

    /// Language for diagnosis labels
    #[serde(default)]
    pub language: Option<Language>,

    /// Default output format
    #[serde(default)]
    pub format: Option<String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("malaria-detection")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Current value of a key, as text.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::ServiceUrl => self.service_url.clone(),
            ConfigKey::Timeout => self.timeout.map(|t| t.to_string()),
            ConfigKey::Database => self.database.as_ref().map(|p| p.display().to_string()),
            ConfigKey::PersistFailures => Some(self.persist_failures.to_string()),
            ConfigKey::Language => self.language.map(|l| l.code().to_string()),
            ConfigKey::Format => self.format.clone(),
            ConfigKey::NoColor => Some(self.no_color.to_string()),
        }
    }

    /// Validate and store a value.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::ServiceUrl => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    bail!("Service URL must start with http:// or https://, got: {}", value);
                }
                self.service_url = Some(value.trim_end_matches('/').to_string());
            }
            ConfigKey::Timeout => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout '{}': expected seconds", value))?;
                if secs == 0 {
                    bail!("Timeout must be at least 1 second");
                }
                self.timeout = Some(secs);
            }
            ConfigKey::Database => self.database = Some(PathBuf::from(value)),
            ConfigKey::PersistFailures => self.persist_failures = parse_bool(value)?,
            ConfigKey::Language => {
                self.language = Some(value.parse().with_context(|| {
                    format!("Invalid language '{}': use en or ru", value)
                })?);
            }
            ConfigKey::Format => {
                let format = OutputFormat::from_str(value, true)
                    .map_err(|_| anyhow::anyhow!("Invalid format '{}': use text, json or csv", value))?;
                self.format = Some(format_name(format).to_string());
            }
            ConfigKey::NoColor => self.no_color = parse_bool(value)?,
        }
        Ok(())
    }

    /// Reset a key to its default.
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::ServiceUrl => self.service_url = None,
            ConfigKey::Timeout => self.timeout = None,
            ConfigKey::Database => self.database = None,
            ConfigKey::PersistFailures => self.persist_failures = false,
            ConfigKey::Language => self.language = None,
            ConfigKey::Format => self.format = None,
            ConfigKey::NoColor => self.no_color = false,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => bail!("Invalid boolean '{}': use true or false", value),
    }
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
    }
}

pub fn resolve_service_url(flag: Option<&str>, config: &Config) -> String {
    flag.map(str::to_string)
        .or_else(|| config.service_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
}

pub fn resolve_timeout(flag: Option<u64>, config: &Config) -> Duration {
    flag.or(config.timeout)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Database path, or `None` for the store's default location.
pub fn resolve_database(flag: Option<&Path>, config: &Config) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| config.database.clone())
}

pub fn resolve_language(flag: Option<Language>, config: &Config) -> Language {
    flag.or(config.language).unwrap_or_default()
}

/// Output format from the flag, else the configured one, else text.
/// An unrecognised configured format is ignored.
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
    flag.or_else(|| {
        config
            .format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    })
    .unwrap_or_default()
}

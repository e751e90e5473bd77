//! Config command implementation.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use malaria_core::{DEFAULT_SERVICE_URL, DEFAULT_TIMEOUT};

use crate::cli::{ConfigAction, ConfigKey};
use crate::config::Config;

fn key_name(key: ConfigKey) -> String {
    key.to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_else(|| format!("{:?}", key))
}

pub fn cmd_config(action: ConfigAction, config: &Config) -> Result<()> {
    let path = Config::path();

    match action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            if content.trim().is_empty() {
                println!("# (all defaults)");
            } else {
                print!("{}", content);
            }
        }
        ConfigAction::Get { key } => match config.get(key) {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        ConfigAction::Set { key, value } => {
            let mut config = config.clone();
            config.set(key, &value)?;
            config.save()?;
            println!("Set {} = {}", key_name(key), value);
        }
        ConfigAction::Unset { key } => {
            let mut config = config.clone();
            config.unset(key);
            config.save()?;
            println!("Unset {}", key_name(key));
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            let config = Config {
                service_url: Some(DEFAULT_SERVICE_URL.to_string()),
                timeout: Some(DEFAULT_TIMEOUT.as_secs()),
                format: Some("text".to_string()),
                ..Default::default()
            };
            config.save()?;
            println!("Created {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_are_kebab_case() {
        assert_eq!(key_name(ConfigKey::ServiceUrl), "service-url");
        assert_eq!(key_name(ConfigKey::PersistFailures), "persist-failures");
        assert_eq!(key_name(ConfigKey::Timeout), "timeout");
    }
}

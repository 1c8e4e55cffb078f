//! Configuration loading

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::Config;

/// Legacy variable holding the base domain of the regional ingest servers
const LEGACY_DOMAIN_VAR: &str = "RTMP_DOMAIN";

/// Load configuration from a config file and the environment, then validate it
///
/// Config file search order:
/// 1. `explicit_path` (from the command line)
/// 2. `STREAMGATE_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. /config/config.yaml (container mount path)
/// 5. Environment variables only
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    if let Some(path) = explicit_path {
        anyhow::ensure!(Path::new(path).exists(), "Config file {path} does not exist");
    }

    let config_path = explicit_path
        .map(str::to_string)
        .or_else(|| std::env::var("STREAMGATE_CONFIG_PATH").ok())
        .filter(|p| Path::new(p).exists())
        .or_else(|| {
            ["config.yaml", "/config/config.yaml"]
                .into_iter()
                .find(|p| Path::new(p).exists())
                .map(str::to_string)
        });

    let mut config = match &config_path {
        Some(path) => {
            eprintln!("Loading config from {path}");
            Config::from_file(path).with_context(|| format!("Failed to load {path}"))?
        }
        None => {
            eprintln!("No config file found, using environment variables");
            Config::from_env().context("Failed to load config from environment")?
        }
    };

    apply_legacy_env(&mut config, std::env::var(LEGACY_DOMAIN_VAR).ok());

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

/// Fill `control.base_domain` from `RTMP_DOMAIN` when it is not configured
fn apply_legacy_env(config: &mut Config, legacy_domain: Option<String>) {
    if !config.control.base_domain.is_empty() {
        return;
    }
    if let Some(domain) = legacy_domain.filter(|d| !d.is_empty()) {
        info!("Using {LEGACY_DOMAIN_VAR} as control.base_domain");
        config.control.base_domain = domain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_domain_fills_empty_base_domain() {
        let mut config = Config::default();
        apply_legacy_env(&mut config, Some("ingest.example.com".to_string()));
        assert_eq!(config.control.base_domain, "ingest.example.com");
    }

    #[test]
    fn test_configured_base_domain_wins() {
        let mut config = Config::default();
        config.control.base_domain = "configured.example.com".to_string();
        apply_legacy_env(&mut config, Some("legacy.example.com".to_string()));
        assert_eq!(config.control.base_domain, "configured.example.com");
    }

    #[test]
    fn test_empty_legacy_domain_is_ignored() {
        let mut config = Config::default();
        apply_legacy_env(&mut config, Some(String::new()));
        assert!(config.control.base_domain.is_empty());
    }
}

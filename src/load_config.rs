use crate::config::ReporterConfig;
use crate::contract::{MAX_HOURS, MIN_HOURS};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable overriding `api_url`.
pub const API_URL_ENV: &str = "OUTAGE_API_URL";

/// Loads a YAML config file and applies the `OUTAGE_API_URL` override.
/// Returns a validated [`ReporterConfig`] or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ReporterConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let config: ReporterConfig = if config_content.trim().is_empty() {
        ReporterConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    finalize(config)
}

/// Applies environment overrides and validates. Used when no file is given.
pub fn finalize(mut config: ReporterConfig) -> Result<ReporterConfig> {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            info!(api_url = %url, "{} found in env, overriding api_url", API_URL_ENV);
            config.api_url = url.trim().to_string();
        }
    }

    if reqwest::Url::parse(&config.api_url).is_err() {
        error!(api_url = %config.api_url, "api_url is not a valid URL");
        anyhow::bail!("api_url is not a valid URL: {}", config.api_url);
    }

    if config.request_timeout_secs == 0 {
        error!("request_timeout_secs must be positive");
        anyhow::bail!("request_timeout_secs must be greater than zero");
    }

    let hours = config.defaults.hours;
    if hours < MIN_HOURS as i64 || hours > MAX_HOURS as i64 {
        error!(hours, "defaults.hours out of range");
        anyhow::bail!(
            "defaults.hours must be between {} and {}, got {}",
            MIN_HOURS,
            MAX_HOURS,
            hours
        );
    }

    config.trace_loaded();
    Ok(config)
}

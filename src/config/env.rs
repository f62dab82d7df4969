//! Environment-backed configuration loading
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! the binary before this runs). Loading fails fast on missing credentials or
//! malformed values; a pipeline that starts with a bad configuration would
//! fail every cycle, so startup is the only place this is allowed to be fatal.

use crate::config::types::{Config, PipelineConfig, PortalConfig, SinkConfig};
use crate::ConfigError;
use std::env;
use std::path::PathBuf;
use url::Url;

const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";
const DEFAULT_ELEMENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Loads the full configuration from the process environment
pub fn load_from_env() -> Result<Config, ConfigError> {
    let config = Config {
        portal: PortalConfig {
            base_url: require("PORTAL_BASE_URL")?,
            login_url: require("PORTAL_LOGIN_URL")?,
            username: require("PORTAL_USERNAME")?,
            password: require("PORTAL_PASSWORD")?,
        },
        sink: SinkConfig {
            database_path: require("DATABASE_PATH")?,
        },
        pipeline: PipelineConfig {
            interval_minutes: optional_parsed("FLIGHTLINE_INTERVAL_MINUTES")?,
            download_dir: env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            element_timeout_secs: optional_parsed("ELEMENT_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_ELEMENT_TIMEOUT_SECS),
            download_timeout_secs: optional_parsed("DOWNLOAD_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        },
    };

    validate(&config)?;
    Ok(config)
}

/// Reads a required environment variable
fn require(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var.to_string())),
    }
}

/// Reads an optional environment variable and parses it
fn optional_parsed<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                message: format!("cannot parse {:?}", value),
            }),
        Err(_) => Ok(None),
    }
}

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_portal_config(&config.portal)?;
    validate_pipeline_config(&config.pipeline)?;
    Ok(())
}

fn validate_portal_config(config: &PortalConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("PORTAL_BASE_URL", &config.base_url),
        ("PORTAL_LOGIN_URL", &config.login_url),
    ] {
        Url::parse(value).map_err(|e| ConfigError::InvalidValue {
            var: name.to_string(),
            message: format!("not a valid URL: {}", e),
        })?;
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if let Some(minutes) = config.interval_minutes {
        if minutes < 1 || minutes > 1440 {
            return Err(ConfigError::Validation(format!(
                "FLIGHTLINE_INTERVAL_MINUTES must be between 1 and 1440, got {}",
                minutes
            )));
        }
    }

    if config.element_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "ELEMENT_TIMEOUT_SECS must be >= 1".to_string(),
        ));
    }

    if config.download_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "DOWNLOAD_TIMEOUT_SECS must be >= 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            portal: PortalConfig {
                base_url: "https://portal.example.com".to_string(),
                login_url: "https://portal.example.com/Login.aspx".to_string(),
                username: "ops".to_string(),
                password: "secret".to_string(),
            },
            sink: SinkConfig {
                database_path: "./flightline.db".to_string(),
            },
            pipeline: PipelineConfig {
                interval_minutes: Some(3),
                download_dir: PathBuf::from("./downloads"),
                element_timeout_secs: 10,
                download_timeout_secs: 120,
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn rejects_malformed_portal_url() {
        let mut config = base_config();
        config.portal.base_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = base_config();
        config.pipeline.interval_minutes = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_excessive_interval() {
        let mut config = base_config();
        config.pipeline.interval_minutes = Some(10_000);
        assert!(validate(&config).is_err());
    }
}

mod atomic;

pub use atomic::write_bytes_atomic;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use schemaload_client::ClientOptions;
use schemaload_client::options::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "schemaload.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliSettings {
    pub backend_url: String,
    pub timeout_secs: u64,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            log_format: LogFormat::Text,
            log_file: None,
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub backend_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<PathBuf>,
}

impl CliSettings {
    pub fn apply(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(backend_url) = overrides.backend_url {
            self.backend_url = backend_url;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
        if overrides.log_file.is_some() {
            self.log_file = overrides.log_file;
        }
        self
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(SettingsError::Invalid(format!(
                "backend_url must start with http:// or https://, got '{}'",
                self.backend_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.backend_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Load settings from `path`, or from `schemaload.toml` when it exists.
///
/// An explicit path must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> SettingsResult<CliSettings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !default_path.exists() {
                return Ok(CliSettings::default());
            }
            default_path
        }
    };

    let content = std::fs::read_to_string(&path)?;
    let settings: CliSettings = toml::from_str(&content)?;
    Ok(settings)
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use publish_core::{SessionSettings, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL};
use publish_engine::ApiSettings;
use publish_logging::publish_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "publish.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("could not write config {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub project_id: Option<String>,
    pub poll_interval_ms: u64,
    pub history_limit: usize,
    pub request_timeout_secs: u64,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            api_base_url: api.base_url,
            auth_token: None,
            project_id: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: api.request_timeout.as_secs(),
            log_destination: LogDestination::default(),
        }
    }
}

impl AppConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base_url.clone(),
            auth_token: self.auth_token.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..ApiSettings::default()
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            history_limit: self.history_limit.max(1),
        }
    }
}

/// Loads the config at `path`; a missing file yields defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let write_error = |message: String| ConfigError::Write {
        path: path.to_path_buf(),
        message,
    };
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(config, pretty).map_err(|err| write_error(err.to_string()))?;
    fs::write(path, content).map_err(|err| write_error(err.to_string()))?;
    publish_info!("Wrote config to {:?}", path);
    Ok(())
}

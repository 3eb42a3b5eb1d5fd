//! Configuration loading
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults apply. A config file that exists but does not parse is
//! a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const ENV_CONFIG_FILE: &str = "SKILLCOACH_CONFIG";
pub const ENV_BASE_URL: &str = "SKILLCOACH_BASE_URL";
pub const ENV_SESSION_FILE: &str = "SKILLCOACH_SESSION_FILE";
pub const ENV_LOG_LEVEL: &str = "SKILLCOACH_LOG_LEVEL";
pub const ENV_POLL_INTERVAL_MS: &str = "SKILLCOACH_POLL_INTERVAL_MS";
pub const ENV_POLL_TIMEOUT_SECS: &str = "SKILLCOACH_POLL_TIMEOUT_SECS";

const APP_DIR: &str = "skillcoach";

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
    pub log_level: String,
    pub recording_seconds: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            poll_interval_ms: 2000,
            poll_timeout_secs: 600,
            request_timeout_secs: 30,
            session_file: default_session_file(),
            log_level: "info".to_string(),
            recording_seconds: 10,
        }
    }
}

/// Contents of `config.toml`; every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub poll_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub session_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub recording_seconds: Option<u64>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub base_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub poll_timeout_secs: Option<u64>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000/api/v1` (no trailing slash)
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// `0` disables the polling deadline
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
    pub log_level: String,
    pub recording_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            base_url: defaults.base_url,
            poll_interval_ms: defaults.poll_interval_ms,
            poll_timeout_secs: defaults.poll_timeout_secs,
            request_timeout_secs: defaults.request_timeout_secs,
            session_file: defaults.session_file,
            log_level: defaults.log_level,
            recording_seconds: defaults.recording_seconds,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with all other values defaulted
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_secs > 0).then(|| Duration::from_secs(self.poll_timeout_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL for an API path such as `/auth/me`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Resolves a [`ClientConfig`] from overrides, environment, file and defaults
pub struct ConfigResolver {
    overrides: ConfigOverrides,
}

impl ConfigResolver {
    pub fn new(overrides: ConfigOverrides) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self) -> Result<ClientConfig> {
        let defaults = CompiledDefaults::for_current_platform();
        let file = self.load_file()?;
        let o = &self.overrides;

        let base_url = o
            .base_url
            .clone()
            .or_else(|| env_string(ENV_BASE_URL))
            .or(file.base_url)
            .unwrap_or(defaults.base_url);

        let session_file = o
            .session_file
            .clone()
            .or_else(|| env_string(ENV_SESSION_FILE).map(PathBuf::from))
            .or(file.session_file)
            .unwrap_or(defaults.session_file);

        let log_level = o
            .log_level
            .clone()
            .or_else(|| env_string(ENV_LOG_LEVEL))
            .or(file.log_level)
            .unwrap_or(defaults.log_level);

        let poll_interval_ms = match o.poll_interval_ms {
            Some(v) => v,
            None => env_u64(ENV_POLL_INTERVAL_MS)?
                .or(file.poll_interval_ms)
                .unwrap_or(defaults.poll_interval_ms),
        };

        let poll_timeout_secs = match o.poll_timeout_secs {
            Some(v) => v,
            None => env_u64(ENV_POLL_TIMEOUT_SECS)?
                .or(file.poll_timeout_secs)
                .unwrap_or(defaults.poll_timeout_secs),
        };

        let config = ClientConfig {
            base_url: normalize_base_url(&base_url),
            poll_interval_ms,
            poll_timeout_secs,
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            session_file,
            log_level,
            recording_seconds: file.recording_seconds.unwrap_or(defaults.recording_seconds),
        };
        config.validate()?;

        debug!(base_url = %config.base_url, session = %config.session_file.display(), "Configuration resolved");
        Ok(config)
    }

    fn load_file(&self) -> Result<TomlConfig> {
        let explicit = self
            .overrides
            .config_file
            .clone()
            .or_else(|| env_string(ENV_CONFIG_FILE).map(PathBuf::from));

        match explicit {
            Some(path) => {
                if path.exists() {
                    TomlConfig::load(&path)
                } else {
                    warn!("Config file {} not found, using defaults", path.display());
                    Ok(TomlConfig::default())
                }
            }
            None => match default_config_file() {
                Some(path) if path.exists() => TomlConfig::load(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(TomlConfig::default())
                }
            },
        }
    }
}

/// `<config_dir>/skillcoach/config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `<data_dir>/skillcoach/session.json`, or `./skillcoach_session.json`
pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("session.json"))
        .unwrap_or_else(|| PathBuf::from("./skillcoach_session.json"))
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} must be an integer, got {:?}", name, raw))),
        None => Ok(None),
    }
}

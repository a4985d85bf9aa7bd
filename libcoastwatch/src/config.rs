//! Configuration management for Coastwatch

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::types::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://sih-backend-1-hiow.onrender.com";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1593968568932-b0b3826625a5?q=80&w=2940&auto=format&fit=crop";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub gate: GateConfig,
    pub location: Option<LocationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_listing_path")]
    pub listing_path: String,
    #[serde(default = "default_report_path")]
    pub report_path: String,
    /// Request timeout, humantime syntax ("30s", "1m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Attach `Authorization: Bearer <token>` to report submissions
    #[serde(default)]
    pub send_auth_header: bool,
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum time the launch gate holds before reporting, humantime syntax
    #[serde(default = "default_min_display")]
    pub min_display: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_listing_path() -> String {
    "/api/reports/getall".to_string()
}

fn default_report_path() -> String {
    "/api/reports/report".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}

fn default_session_path() -> String {
    "~/.local/share/coastwatch/session.toml".to_string()
}

fn default_min_display() -> String {
    "2500ms".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            listing_path: default_listing_path(),
            report_path: default_report_path(),
            timeout: default_timeout(),
            send_auth_header: false,
            placeholder_image_url: default_placeholder_image(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_display: default_min_display(),
        }
    }
}

impl ApiConfig {
    pub fn listing_url(&self) -> String {
        join_url(&self.base_url, &self.listing_path)
    }

    pub fn report_url(&self) -> String {
        join_url(&self.base_url, &self.report_path)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration("api.timeout", &self.timeout)
    }
}

impl SessionConfig {
    /// Session file path with `~` expanded
    pub fn expand_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

impl GateConfig {
    pub fn min_display(&self) -> Result<Duration> {
        parse_duration("gate.min_display", &self.min_display)
    }
}

impl From<LocationConfig> for Coordinate {
    fn from(location: LocationConfig) -> Self {
        Coordinate::new(location.latitude, location.longitude)
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// An explicit `COASTWATCH_CONFIG` path must exist. When the default
    /// location has no file yet, the built-in defaults are used.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if std::env::var_os("COASTWATCH_CONFIG").is_none() && !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            location: None,
        }
    }

    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if self.session.path.trim().is_empty() {
            return Err(ConfigError::MissingField("session.path".to_string()).into());
        }
        self.api.timeout()?;
        self.gate.min_display()?;
        if let Some(location) = &self.location {
            Coordinate::from(*location).validate().map_err(|reason| {
                ConfigError::InvalidValue {
                    field: "location".to_string(),
                    reason,
                }
            })?;
        }
        Ok(())
    }
}

/// Resolve the configuration file path (`COASTWATCH_CONFIG`, then the XDG config dir)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("COASTWATCH_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("coastwatch").join("config.toml"))
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

// TOML config adapter - Application configuration from TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::ConnectionInfo;
use crate::engine::EngineConfig;
use crate::ports::LogLevel;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "swingtrim.toml";

/// Everything the binary can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: EngineConfig,
    pub platform: PlatformConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Static description of the device the pipeline pretends to run on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub user_agent: String,
    pub max_touch_points: u32,
    /// Formats the encoder accepts; empty means whatever the media backend supports
    pub encodable_mime_types: Vec<String>,
    /// Network type (`slow-2g`, `2g`, `3g`, `4g`); absent means no network information
    pub effective_type: Option<String>,
    pub downlink: Option<f64>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) swingtrim".to_string(),
            max_touch_points: 0,
            encodable_mime_types: Vec::new(),
            effective_type: None,
            downlink: None,
        }
    }
}

impl PlatformConfig {
    pub fn connection(&self) -> Option<ConnectionInfo> {
        self.effective_type.as_ref().map(|effective_type| ConnectionInfo {
            effective_type: effective_type.clone(),
            downlink: self.downlink,
        })
    }
}

/// Analysis backend endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Base URL of the backend issuing signed uploads and status answers
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            return Err(DomainError::Config(format!(
                "Config file does not exist: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Io(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if present, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, DomainError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, DomainError> {
        toml::to_string_pretty(self)
            .map_err(|e| DomainError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.pipeline.validate()?;
        LogLevel::parse(&self.logging.level)?;
        if let Some(downlink) = self.platform.downlink {
            if !downlink.is_finite() || downlink < 0.0 {
                return Err(DomainError::Config(
                    "platform.downlink must be a non-negative number".to_string(),
                ));
            }
        }
        if self.upload.base_url.trim().is_empty() {
            return Err(DomainError::Config("upload.base_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

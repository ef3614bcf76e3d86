//! Configuration for fibchat.
//!
//! Settings are read from `appsettings.json` (or the file named by `FIBCHAT_CONFIG`) and can
//! be overridden from the environment:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `AZURE_OPENAI_ENDPOINT` | `AzureOpenAI.Endpoint` |
//! | `AZURE_OPENAI_DEPLOYMENT` | `AzureOpenAI.DeploymentName` |
//! | `AZURE_OPENAI_API_KEY` | `AzureOpenAI.ApiKey` |
//! | `AZURE_OPENAI_API_VERSION` | `AzureOpenAI.ApiVersion` |
//! | `FIBCHAT_USE_MOCK` | `GroupChat.UseMockCompletion` |
//!
//! A missing file is fine, every setting has a default. A file that exists but does not
//! parse is an error.
//!
//! # Example
//!
//! ```rust
//! use fibchat::config::AppConfig;
//!
//! let config = AppConfig::from_json_str(r#"{
//!     "AzureOpenAI": { "Endpoint": "https://example.openai.azure.com", "DeploymentName": "gpt-4o", "ApiKey": "k" },
//!     "GroupChat": { "MaximumIterations": 6 }
//! }"#).unwrap();
//! assert_eq!(config.group_chat.maximum_iterations, 6);
//! assert!(config.group_chat.automatic_reset);
//! assert!(config.validate().is_ok());
//! ```

use crate::fibchat::termination::DEFAULT_MAXIMUM_ITERATIONS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";
pub const CONFIG_PATH_ENV: &str = "FIBCHAT_CONFIG";
pub const DEFAULT_API_VERSION: &str = "2024-06-01";
pub const DEFAULT_MOCK_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io { path: PathBuf, message: String },
    /// The file is not valid JSON or has the wrong shape.
    Parse { path: PathBuf, message: String },
    /// A required setting is empty. Holds the setting key.
    MissingSetting(&'static str),
    /// A setting has an unusable value.
    Invalid { setting: &'static str, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read {}: {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Failed to parse {}: {}", path.display(), message)
            }
            ConfigError::MissingSetting("ApiKey") => write!(
                f,
                "Azure OpenAI ApiKey is not configured. Please set AZURE_OPENAI_API_KEY or AzureOpenAI:ApiKey in your appsettings.json file."
            ),
            ConfigError::MissingSetting(key) => write!(
                f,
                "Azure OpenAI {} is not configured. Please check your appsettings.json file.",
                key
            ),
            ConfigError::Invalid { setting, message } => {
                write!(f, "Invalid value for {}: {}", setting, message)
            }
        }
    }
}

impl Error for ConfigError {}

/// `AzureOpenAI` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AzureOpenAISettings {
    pub endpoint: String,
    pub deployment_name: String,
    pub api_key: String,
    pub api_version: String,
}

impl Default for AzureOpenAISettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment_name: String::new(),
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// `GroupChat` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GroupChatSettings {
    pub maximum_iterations: usize,
    pub automatic_reset: bool,
    /// Use the offline mock backend instead of Azure OpenAI.
    pub use_mock_completion: bool,
    pub mock_delay_ms: u64,
}

impl Default for GroupChatSettings {
    fn default() -> Self {
        Self {
            maximum_iterations: DEFAULT_MAXIMUM_ITERATIONS,
            automatic_reset: true,
            use_mock_completion: false,
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "AzureOpenAI")]
    pub azure_openai: AzureOpenAISettings,
    #[serde(rename = "GroupChat")]
    pub group_chat: GroupChatSettings,
}

impl AppConfig {
    /// Load from `FIBCHAT_CONFIG` (or `appsettings.json`) and apply environment overrides.
    ///
    /// Does not validate; call [`validate`](AppConfig::validate) once the config is final.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a settings file. A missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} not found, using default settings", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not wipe a setting.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.azure_openai.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT") {
            self.azure_openai.deployment_name = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.azure_openai.api_key = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.azure_openai.api_version = v;
        }
        if let Some(v) = get("FIBCHAT_USE_MOCK") {
            self.group_chat.use_mock_completion = parse_flag(&v).ok_or_else(|| {
                ConfigError::Invalid {
                    setting: "FIBCHAT_USE_MOCK",
                    message: format!("expected true/false, got '{}'", v),
                }
            })?;
        }
        Ok(())
    }

    /// Check that the configuration can drive a session.
    ///
    /// Azure settings are only required when the mock backend is off.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_chat.maximum_iterations == 0 {
            return Err(ConfigError::Invalid {
                setting: "MaximumIterations",
                message: "must be at least 1".to_string(),
            });
        }
        if self.group_chat.use_mock_completion {
            return Ok(());
        }

        let azure = &self.azure_openai;
        if azure.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingSetting("Endpoint"));
        }
        if azure.deployment_name.trim().is_empty() {
            return Err(ConfigError::MissingSetting("DeploymentName"));
        }
        if azure.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting("ApiKey"));
        }
        if azure.api_version.trim().is_empty() {
            return Err(ConfigError::MissingSetting("ApiVersion"));
        }
        if !azure.endpoint.starts_with("http://") && !azure.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                setting: "Endpoint",
                message: format!("'{}' is not an http(s) URL", azure.endpoint),
            });
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

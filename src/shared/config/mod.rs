//! Application configuration module
//!
//! Backend selection and connection settings. Values come from the
//! environment, a TOML file, or the settings the user saved locally; the
//! builder validates whatever combination ends up being used.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Deployment URL left in the sample settings; treated as "not configured"
pub const PLACEHOLDER_API_URL: &str =
    "https://script.google.com/macros/s/YOUR_DEPLOYMENT_ID/exec";

/// Which remote adapter to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Spreadsheet-backed RPC endpoint
    #[default]
    Rpc,
    /// Document database behind a REST API
    Document,
    /// In-process store, nothing leaves the machine
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rpc" | "sheet" | "sheets" => Ok(Self::Rpc),
            "document" | "doc" | "rest" => Ok(Self::Document),
            "memory" | "local" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "backend",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote adapter
    pub backend: BackendKind,
    /// RPC endpoint or document API base URL
    pub api_url: Option<String>,
    /// API key for the document backend
    pub api_key: Option<String>,
    /// Spreadsheet id the RPC endpoint writes to
    pub sheet_id: Option<String>,
    /// Report template document id
    pub doc_id: Option<String>,
    /// Local database file; platform data dir when unset
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The API URL, unless it is missing or still the template placeholder
    pub fn effective_api_url(&self) -> Option<&str> {
        self.api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != PLACEHOLDER_API_URL)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = self.effective_api_url() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.to_string()));
            }
        }
        if self.backend == BackendKind::Document && self.effective_api_url().is_none() {
            return Err(ConfigError::MissingValue("api_url"));
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn sheet_id(mut self, id: impl Into<String>) -> Self {
        self.config.sheet_id = Some(id.into());
        self
    }

    pub fn doc_id(mut self, id: impl Into<String>) -> Self {
        self.config.doc_id = Some(id.into());
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

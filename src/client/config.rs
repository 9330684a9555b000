use std::path::Path;
use std::time::Duration;

use crate::client::local_db::ApiSettings;
use crate::client::sync::SyncConfig;
use crate::shared::config::{AppConfig, BackendKind, ConfigError};

/// Optional TOML file with the `AppConfig` keys
const CONFIG_FILE_VAR: &str = "EVENTLOG_CONFIG";

/// Application configuration wrapper: backend settings plus sync tunables.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
    sync: SyncConfig,
}

impl Config {
    pub fn new(app: AppConfig, sync: SyncConfig) -> Self {
        Self { app, sync }
    }

    /// Read `EVENTLOG_*` variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. A TOML file named by `EVENTLOG_CONFIG` is
    /// read first; individual variables override it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut app = match var(CONFIG_FILE_VAR) {
            Some(path) => read_toml(Path::new(&path))?,
            None => AppConfig::default(),
        };

        if let Some(backend) = var("EVENTLOG_BACKEND") {
            app.backend = backend.parse::<BackendKind>()?;
        }
        if let Some(url) = var("EVENTLOG_API_URL") {
            app.api_url = Some(url);
        }
        if let Some(key) = var("EVENTLOG_API_KEY") {
            app.api_key = Some(key);
        }
        if let Some(id) = var("EVENTLOG_SHEET_ID") {
            app.sheet_id = Some(id);
        }
        if let Some(path) = var("EVENTLOG_DB_PATH") {
            app.db_path = Some(path.into());
        }
        app.validate()?;

        let mut sync = SyncConfig::default();
        if let Some(ms) = var("EVENTLOG_DEBOUNCE_MS") {
            sync.debounce = Duration::from_millis(parse_number("EVENTLOG_DEBOUNCE_MS", &ms)?);
        }
        if let Some(secs) = var("EVENTLOG_HEARTBEAT_SECS") {
            // 0 turns the heartbeat off
            let secs = parse_number("EVENTLOG_HEARTBEAT_SECS", &secs)?;
            sync.heartbeat_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(retries) = var("EVENTLOG_MAX_RETRIES") {
            sync.max_retries = parse_number("EVENTLOG_MAX_RETRIES", &retries)?;
        }
        if let Some(auto) = var("EVENTLOG_AUTO_SYNC") {
            sync.auto_sync = match auto.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "EVENTLOG_AUTO_SYNC",
                        value: auto,
                    })
                }
            };
        }

        Ok(Self { app, sync })
    }

    /// Overlay settings the user saved locally; they win over the environment
    pub fn apply_settings(&mut self, settings: &ApiSettings) -> Result<(), ConfigError> {
        let mut app = self.app.clone();
        settings.apply_to(&mut app);
        app.validate()?;
        self.app = app;
        Ok(())
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncConfig {
        &mut self.sync
    }
}

fn read_toml(path: &Path) -> Result<AppConfig, ConfigError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
    AppConfig::from_toml_str(&source)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

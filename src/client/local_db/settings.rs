//! User settings kept next to the sync slots: the "signed in" flag, the UI
//! theme and the API connection settings from the settings dialog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::local_db::schema::keys;
use crate::client::local_db::LocalDatabase;
use crate::shared::config::AppConfig;
use crate::shared::error::{SyncError, SyncResult};

/// UI colour scheme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(SyncError::validation("theme", format!("unknown theme '{}'", other))),
        }
    }
}

/// Connection settings saved from the settings dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiSettings {
    pub api_url: Option<String>,
    pub sheet_id: Option<String>,
    pub doc_id: Option<String>,
}

impl ApiSettings {
    /// Overlay saved values onto `config`; unset values leave it alone
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(id) = &self.sheet_id {
            config.sheet_id = Some(id.clone());
        }
        if let Some(id) = &self.doc_id {
            config.doc_id = Some(id.clone());
        }
    }
}

impl LocalDatabase {
    pub async fn is_authenticated(&self) -> SyncResult<bool> {
        Ok(self.get_value(keys::IS_AUTHENTICATED).await?.as_deref() == Some("true"))
    }

    pub async fn set_authenticated(&self, authenticated: bool) -> SyncResult<()> {
        let value = if authenticated { "true" } else { "false" };
        self.set_value(keys::IS_AUTHENTICATED, value).await
    }

    /// Saved theme; unknown values fall back to the default
    pub async fn theme(&self) -> SyncResult<Theme> {
        let saved = self.get_value(keys::THEME).await?;
        Ok(saved
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: Theme) -> SyncResult<()> {
        self.set_value(keys::THEME, theme.as_str()).await
    }

    pub async fn api_settings(&self) -> SyncResult<ApiSettings> {
        Ok(ApiSettings {
            api_url: self.get_value(keys::API_URL).await?,
            sheet_id: self.get_value(keys::SHEET_ID).await?,
            doc_id: self.get_value(keys::DOC_ID).await?,
        })
    }

    /// Save connection settings. Blank values keep whatever was saved before.
    pub async fn save_api_settings(&self, settings: &ApiSettings) -> SyncResult<()> {
        let slots = [
            (keys::API_URL, &settings.api_url),
            (keys::SHEET_ID, &settings.sheet_id),
            (keys::DOC_ID, &settings.doc_id),
        ];
        for (key, value) in slots {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                self.set_value(key, value).await?;
            }
        }
        Ok(())
    }
}

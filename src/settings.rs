use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TallyError};
use crate::provider::Environment;

const DB_FILE: &str = "tally.db";

/// One linked institution login and the token used to sync it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedItem {
    pub item_id: String,
    pub access_token: String,
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub items: Vec<LinkedItem>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            environment: Environment::default(),
            base_url: None,
            client_id: String::new(),
            secret: String::new(),
            log_level: default_log_level(),
            items: Vec::new(),
        }
    }
}

impl Settings {
    /// Upstream API root: the explicit override, else the environment's host.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    pub fn require_credentials(&self) -> Result<()> {
        if self.client_id.is_empty() || self.secret.is_empty() {
            return Err(TallyError::config(
                "not set up: run `tally init --client-id <id> --secret <secret>`",
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.data_dir)).join(DB_FILE)
    }

    pub fn find_item(&self, item_id: &str) -> Option<&LinkedItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    /// Add or replace the item with the same id.
    pub fn upsert_item(&mut self, item: LinkedItem) {
        match self.items.iter_mut().find(|i| i.item_id == item.item_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove_item(&mut self, item_id: &str) -> Option<LinkedItem> {
        let pos = self.items.iter().position(|i| i.item_id == item_id)?;
        Some(self.items.remove(pos))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tally")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("tally")
}

pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path())
}

/// A missing file means defaults. A malformed one is a configuration error,
/// so the file is never overwritten with defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content).map_err(|e| {
        warn!(path = %path.display(), error = %e, "malformed settings file");
        TallyError::config(format!("malformed settings file {}: {e}", path.display()))
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::{DEFAULT_DEDUP_WINDOW, SessionConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_ENDPOINT: &str =
    "wss://demo.piesocket.com/v3/channel_1?api_key=DEMOKEY&notify_self";
pub const DEFAULT_DATABASE_PATH: &str = "data/chat.db";
pub const DEFAULT_STORAGE_KEY: &str = "chatMessages";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// WebSocket endpoint of the channel.
    pub endpoint: String,
    pub database_path: String,
    /// Key the message log is saved under.
    pub storage_key: String,
    pub dedup_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            dedup_window_secs: DEFAULT_DEDUP_WINDOW.as_secs(),
        }
    }
}

impl AppConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.endpoint.clone(),
            storage_key: self.storage_key.clone(),
            dedup_window: Duration::from_secs(self.dedup_window_secs),
        }
    }
}

/// Read the config file, falling back to defaults. A missing file is
/// created with the defaults so it can be edited later.
pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::info!(
                "Config file {} not found; writing defaults",
                path.display()
            );
            let config = AppConfig::default();
            if let Err(err) = save_config(path, &config) {
                log::warn!("Unable to create {}: {err}", path.display());
            }
            config
        }
        Err(err) => {
            log::warn!("Failed to read config file {}: {err}", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    crate::storage::ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

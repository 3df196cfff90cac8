use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StoreError;
use crate::store::{write_atomic, SaveStrategy, StoreOptions};

pub const DEFAULT_STORE_NAME: &str = "storage2";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreSettings {
    pub store_name: String,
    pub data_dir: PathBuf,
    pub save_on_change: bool,
    pub save_strategy: SaveStrategy,
    pub save_interval_ms: u64,
    pub reset_on_start: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            data_dir: dirs::data_dir()
                .map(|d| d.join("scratchpad"))
                .unwrap_or_else(|| PathBuf::from(".")),
            save_on_change: true,
            save_strategy: SaveStrategy::Debounce,
            save_interval_ms: 500,
            reset_on_start: false,
        }
    }
}

impl StoreSettings {
    /// Defaults, with the store kept under `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.store_name))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            save_on_change: self.save_on_change,
            save_strategy: self.save_strategy,
            save_interval: Duration::from_millis(self.save_interval_ms),
            reset_on_start: self.reset_on_start,
        }
    }

    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, &json)
    }
}

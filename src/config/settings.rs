use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::notify::{Permission, PermissionSource};

// Fallback location used until the user sets one.
fn default_latitude() -> f64 {
    51.5074
}
fn default_longitude() -> f64 {
    -0.1278
}
fn default_location_name() -> String {
    "London (Default)".to_string()
}
fn default_calc_method() -> String {
    "NorthAmerica".to_string()
}
fn default_madhab() -> String {
    "Shafi".to_string()
}
fn default_hijri_offset() -> i32 {
    0
}
fn default_refresh_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalahConfig {
    #[serde(default = "default_location_name")]
    pub location_name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_calc_method")]
    pub calc_method: String,
    #[serde(default = "default_madhab")]
    pub madhab: String,
    /// Minutes from UTC. Unset means the device's own zone.
    #[serde(default)]
    pub timezone_offset: Option<i32>,
    /// Days to add/subtract from Hijri date for local moon sighting.
    #[serde(default = "default_hijri_offset")]
    pub hijri_offset: i32,
}

impl Default for SalahConfig {
    fn default() -> Self {
        Self {
            location_name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            calc_method: default_calc_method(),
            madhab: default_madhab(),
            timezone_offset: None,
            hijri_offset: default_hijri_offset(),
        }
    }
}

impl SalahConfig {
    pub fn is_fallback_location(&self) -> bool {
        self.location_name == default_location_name()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// The user-facing on/off switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub permission: Permission,
    /// Desktop notification command, e.g. "notify-send". Falls back to the
    /// console when unset or failing.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default = "default_true")]
    pub bell: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            permission: Permission::default(),
            command: None,
            bell: true,
        }
    }
}

impl PermissionSource for NotificationConfig {
    fn permission(&self) -> Permission {
        self.permission
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Countdown refresh cadence.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub salah: SalahConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "waqt").context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("waqt.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

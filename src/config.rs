use crate::calendar::{EventColor, EventTemplate, DEFAULT_DURATION_MINUTES, NO_CATEGORY};
use crate::env_manager::{self, STATE_DIR_VAR, STORAGE_KEY_VAR};
use crate::state::JsonFileStorage;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_KEY: &str = "calgrid-events";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: EventDefaults,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub key: String,
    pub dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { key: DEFAULT_STORAGE_KEY.to_string(), dir: None }
    }
}

/// Field values applied to events created without them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDefaults {
    pub duration_minutes: u32,
    pub color: EventColor,
    pub category: String,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            duration_minutes: DEFAULT_DURATION_MINUTES,
            color: EventColor::default(),
            category: NO_CATEGORY.to_string(),
        }
    }
}

impl EventDefaults {
    pub fn apply(&self, template: &mut EventTemplate) {
        template.duration_minutes = self.duration_minutes;
        template.color = self.color;
        template.category = self.category.clone();
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Storage key in effect: `CALGRID_STORAGE_KEY` when set, else the configured key.
    pub fn storage_key(&self) -> String {
        self.storage_key_with(env_manager::get_env_var(STORAGE_KEY_VAR))
    }

    fn storage_key_with(&self, env_key: Option<String>) -> String {
        env_manager::non_blank(env_key)
            .or_else(|| env_manager::non_blank(Some(self.storage.key.clone())))
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string())
    }

    /// Directory for slot files: `CALGRID_STATE_DIR`, then `storage.dir`, then the data dir.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = env_manager::get_env_var(STATE_DIR_VAR) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.storage.dir {
            return Ok(dir.clone());
        }
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    pub fn open_storage(&self) -> Result<JsonFileStorage> {
        let dir = self.state_dir()?;
        let key = self.storage_key();
        JsonFileStorage::new(&dir, &key)
            .with_context(|| format!("Failed to open storage slot '{}' in {}", key, dir.display()))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "calgrid", "calgrid").context("Failed to determine config directory")
}

fn get_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.storage.key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.storage.dir, None);
        assert_eq!(config.defaults.duration_minutes, 60);
        assert_eq!(config.defaults.color, EventColor::Blue);
        assert_eq!(config.defaults.category, NO_CATEGORY);
    }

    #[test]
    fn test_config_save_load() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.key = "work-calendar".to_string();
        config.defaults.color = EventColor::Teal;
        config.save_to(&config_path)?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.storage.key, "work-calendar");
        assert_eq!(loaded.defaults.color, EventColor::Teal);
        Ok(())
    }

    #[test]
    fn test_partial_config_uses_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[defaults]\ncolor = \"#EC4899\"\n")?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.storage.key, DEFAULT_STORAGE_KEY);
        assert_eq!(loaded.defaults.color, EventColor::Pink);
        assert_eq!(loaded.defaults.duration_minutes, 60);
        Ok(())
    }

    #[test]
    fn test_storage_key_prefers_environment() {
        let mut config = Config::default();
        config.storage.key = "from-file".to_string();
        assert_eq!(config.storage_key_with(Some("from-env".to_string())), "from-env");
        assert_eq!(config.storage_key_with(Some("  ".to_string())), "from-file");
        assert_eq!(config.storage_key_with(None), "from-file");

        config.storage.key = String::new();
        assert_eq!(config.storage_key_with(None), DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_defaults_apply_to_template() {
        let defaults = EventDefaults { duration_minutes: 25, color: EventColor::Green, category: "Focus".to_string() };
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let mut template = EventTemplate::new("Pomodoro", start);
        defaults.apply(&mut template);
        assert_eq!(template.duration_minutes, 25);
        assert_eq!(template.color, EventColor::Green);
        assert_eq!(template.category, "Focus");
    }
}

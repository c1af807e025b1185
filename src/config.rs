use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::timer;
use crate::utils;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Mirror directory for sync; sync is disabled when unset
    #[serde(default)]
    pub mirror_dir: Option<String>,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,
    #[serde(default = "default_min_credit_secs")]
    pub min_credit_secs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_nagging_enabled")]
    pub nagging_enabled: bool,
    #[serde(default = "default_deadline_reminders_enabled")]
    pub deadline_reminders_enabled: bool,
    #[serde(default = "default_quiet_start_hour")]
    pub quiet_start_hour: u32,
    #[serde(default = "default_quiet_end_hour")]
    pub quiet_end_hour: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            mirror_dir: None,
            focus: FocusConfig::default(),
            reminders: ReminderConfig::default(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            session_minutes: default_session_minutes(),
            min_credit_secs: default_min_credit_secs(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            nagging_enabled: default_nagging_enabled(),
            deadline_reminders_enabled: default_deadline_reminders_enabled(),
            quiet_start_hour: default_quiet_start_hour(),
            quiet_end_hour: default_quiet_end_hour(),
        }
    }
}

impl FocusConfig {
    /// Minimum elapsed time before a stopped session earns credit, in ms
    pub fn min_credit_ms(&self) -> i64 {
        i64::from(self.min_credit_secs) * 1000
    }
}

// Default value functions
fn default_database_path() -> String {
    // This is a fallback - actual profile will be determined at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("nextup.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/nextup/nextup.db".to_string()
    }
}

fn default_session_minutes() -> u32 {
    timer::DEFAULT_SESSION_MINUTES
}

fn default_min_credit_secs() -> u32 {
    60
}

fn default_nagging_enabled() -> bool {
    true
}

fn default_deadline_reminders_enabled() -> bool {
    true
}

fn default_quiet_start_hour() -> u32 {
    22
}

fn default_quiet_end_hour() -> u32 {
    8
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            config.normalize(profile);
            Ok(config)
        } else {
            // Create default config and save it
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            let save_result = config.save_with_profile(profile);
            if let Err(ref e) = save_result {
                eprintln!("ERROR: Failed to save config file: {}", e);
                eprintln!("Config path: {:?}", config_path);
            }
            save_result?;
            Ok(config)
        }
    }

    /// Load configuration from file, using production profile
    /// Use load_with_profile() to specify a different profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod)
    }

    /// Pull hand-edited values back into their supported ranges
    fn normalize(&mut self, profile: utils::Profile) {
        let (min, max) = timer::SESSION_MINUTES_RANGE;
        self.focus.session_minutes = self.focus.session_minutes.clamp(min, max);
        self.reminders.quiet_start_hour = self.reminders.quiet_start_hour.min(23);
        self.reminders.quiet_end_hour = self.reminders.quiet_end_hour.min(23);
        if self.database_path.trim().is_empty() {
            self.database_path = Self::default_database_path_for_profile(profile);
        }
    }

    /// Save configuration to file
    pub fn save_with_profile(&self, profile: utils::Profile) -> Result<(), ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Save configuration to file, using production profile
    /// Use save_with_profile() to specify a different profile
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_with_profile(utils::Profile::Prod)
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("nextup.db").to_string_lossy().to_string()
        } else {
            // Fallback paths - platform-specific
            #[cfg(target_os = "macos")]
            {
                match profile {
                    utils::Profile::Dev => {
                        "~/Library/Application Support/nextup-dev/nextup.db".to_string()
                    }
                    utils::Profile::Prod => {
                        "~/Library/Application Support/nextup/nextup.db".to_string()
                    }
                }
            }
            #[cfg(not(target_os = "macos"))]
            {
                match profile {
                    utils::Profile::Dev => "~/.local/share/nextup-dev/nextup.db".to_string(),
                    utils::Profile::Prod => "~/.local/share/nextup/nextup.db".to_string(),
                }
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Get the expanded mirror directory, if sync is configured
    pub fn get_mirror_dir(&self) -> Option<PathBuf> {
        self.mirror_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
            .map(utils::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_the_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.focus.session_minutes, 25);
        assert_eq!(config.focus.min_credit_secs, 60);
        assert!(config.reminders.nagging_enabled);
        assert!(config.reminders.deadline_reminders_enabled);
        assert_eq!(config.reminders.quiet_start_hour, 22);
        assert_eq!(config.reminders.quiet_end_hour, 8);
        assert!(config.mirror_dir.is_none());
        assert!(config.database_path.ends_with("nextup.db"));
    }

    #[test]
    fn partial_toml_fills_in_the_rest() {
        let config: Config =
            toml::from_str("[reminders]\nnagging_enabled = false\nquiet_start_hour = 23\n")
                .unwrap();
        assert!(!config.reminders.nagging_enabled);
        assert_eq!(config.reminders.quiet_start_hour, 23);
        assert_eq!(config.reminders.quiet_end_hour, 8);
        assert_eq!(config.focus.session_minutes, 25);
    }

    #[test]
    fn out_of_range_values_are_clamped_on_load() {
        let mut config: Config =
            toml::from_str("[focus]\nsession_minutes = 240\n\n[reminders]\nquiet_end_hour = 99\n")
                .unwrap();
        config.normalize(utils::Profile::Dev);
        assert_eq!(config.focus.session_minutes, 90);
        assert_eq!(config.reminders.quiet_end_hour, 23);

        let mut config: Config = toml::from_str("[focus]\nsession_minutes = 1\n").unwrap();
        config.normalize(utils::Profile::Dev);
        assert_eq!(config.focus.session_minutes, 5);
    }

    #[test]
    fn blank_database_path_falls_back_to_the_profile_default() {
        let mut config: Config = toml::from_str("database_path = \"  \"\n").unwrap();
        config.normalize(utils::Profile::Dev);
        assert!(config.database_path.ends_with("nextup.db"));
        assert!(!config.database_path.trim().is_empty());
    }

    #[test]
    fn serialization_round_trips() {
        let mut config = Config::default();
        config.mirror_dir = Some("~/mirror".to_string());
        config.focus.session_minutes = 45;
        config.reminders.nagging_enabled = false;

        let toml_string = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(restored.mirror_dir.as_deref(), Some("~/mirror"));
        assert_eq!(restored.focus.session_minutes, 45);
        assert!(!restored.reminders.nagging_enabled);
    }

    #[test]
    fn stale_keys_from_older_builds_are_ignored() {
        let config: Config =
            toml::from_str("config_version = 1\n\n[focus]\nsession_minutes = 30\n").unwrap();
        assert_eq!(config.focus.session_minutes, 30);
    }

    #[test]
    fn min_credit_converts_to_ms() {
        let focus = FocusConfig {
            session_minutes: 25,
            min_credit_secs: 90,
        };
        assert_eq!(focus.min_credit_ms(), 90_000);
    }

    #[test]
    fn blank_mirror_dir_counts_as_unset() {
        let config: Config = toml::from_str("mirror_dir = \"\"\n").unwrap();
        assert!(config.get_mirror_dir().is_none());
    }
}

//! Configuration management for Volume Raiser
//!
//! Handles loading and saving the optional YAML configuration file. Every key
//! has a default, so a missing file is the same as an empty one.

use crate::audio::VolumeLevel;
use crate::process::ProcessFilter;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Wait for Enter before exiting interactive runs
    pub pause_on_exit: bool,
    /// What a run without a subcommand does
    pub default_action: DefaultAction,
    /// Executable names never touched by normalization
    pub excluded_processes: Vec<String>,
    /// Ignore shell host windows (Start menu, search, ...)
    pub skip_shell_processes: bool,
    /// Target level for `reset`
    pub reset_level: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Also write logs to the application logs directory
    pub log_to_file: bool,
}

/// Action taken by a run without a subcommand
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DefaultAction {
    Normalize,
    Mute,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pause_on_exit: true,
            default_action: DefaultAction::Normalize,
            excluded_processes: Vec::new(),
            skip_shell_processes: true,
            reset_level: 1.0,
            log_level: None,
            log_to_file: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config
            .reset_level()
            .with_context(|| format!("Invalid reset_level in {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration, or fall back to defaults when the file is absent
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn reset_level(&self) -> Result<VolumeLevel> {
        Ok(VolumeLevel::new(self.reset_level)?)
    }

    pub fn process_filter(&self) -> ProcessFilter {
        ProcessFilter {
            excluded: self.excluded_processes.clone(),
            skip_shell: self.skip_shell_processes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "default_action: mute\nexcluded_processes:\n  - Discord.exe\n",
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.default_action, DefaultAction::Mute);
        assert_eq!(config.excluded_processes, vec!["Discord.exe".to_string()]);
        assert!(config.pause_on_exit);
        assert_eq!(config.reset_level, 1.0);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let config = AppConfig {
            pause_on_exit: false,
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_out_of_range_reset_level_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "reset_level: 1.5\n").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("reset_level"));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "pause_on_exit: [not, a, bool]\n").unwrap();

        assert!(AppConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config: AppConfig = serde_yaml::from_str(include_str!("../config.example.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_process_filter_follows_config() {
        let config = AppConfig {
            excluded_processes: vec!["obs64.exe".to_string()],
            skip_shell_processes: false,
            ..Default::default()
        };
        let filter = config.process_filter();
        assert_eq!(filter.excluded, vec!["obs64.exe".to_string()]);
        assert!(!filter.skip_shell);
    }
}

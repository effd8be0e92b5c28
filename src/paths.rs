//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker file next to the executable keeps
//!   `config.yaml` and `logs/` in that same directory.
//! - **Installed mode** (default): data lives in `%APPDATA%\Volume Raiser`
//!   (or the platform equivalent from `dirs`).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "Volume Raiser";

/// Application paths for config and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether running in portable mode (config next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on the executable location.
    ///
    /// Called before logging is initialized.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::resolve(&exe_dir, dirs::config_dir())
    }

    /// Resolve paths from an executable directory and a per-user config root
    pub fn resolve(exe_dir: &Path, config_root: Option<PathBuf>) -> Self {
        if exe_dir.join(".portable").exists() {
            return Self {
                config: exe_dir.join("config.yaml"),
                logs_dir: exe_dir.join("logs"),
                is_portable: true,
            };
        }

        let app_data = config_root
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no per-user config directory, falling back to exe dir");
                exe_dir.to_path_buf()
            })
            .join(APP_NAME);

        Self {
            config: app_data.join("config.yaml"),
            logs_dir: app_data.join("logs"),
            is_portable: false,
        }
    }

    /// Replace the config path with an explicit one (from `--config`)
    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = config.into();
        self
    }

    /// Create the logs directory if it does not exist yet
    pub fn ensure_logs_dir(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir).with_context(|| {
                format!("Failed to create logs directory {}", self.logs_dir.display())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_portable_marker_keeps_files_next_to_exe() {
        let exe_dir = tempdir().unwrap();
        std::fs::write(exe_dir.path().join(".portable"), "").unwrap();

        let paths = AppPaths::resolve(exe_dir.path(), Some(PathBuf::from("/unused")));

        assert!(paths.is_portable);
        assert_eq!(paths.config, exe_dir.path().join("config.yaml"));
        assert_eq!(paths.logs_dir, exe_dir.path().join("logs"));
    }

    #[test]
    fn test_installed_mode_uses_config_root() {
        let exe_dir = tempdir().unwrap();
        let root = tempdir().unwrap();

        let paths = AppPaths::resolve(exe_dir.path(), Some(root.path().to_path_buf()));

        assert!(!paths.is_portable);
        assert_eq!(paths.config, root.path().join(APP_NAME).join("config.yaml"));
    }

    #[test]
    fn test_explicit_config_and_log_dir_creation() {
        let root = tempdir().unwrap();
        let paths = AppPaths::resolve(root.path(), Some(root.path().to_path_buf()))
            .with_config(root.path().join("custom.yaml"));

        assert_eq!(paths.config, root.path().join("custom.yaml"));
        paths.ensure_logs_dir().unwrap();
        assert!(paths.logs_dir.is_dir());
    }
}

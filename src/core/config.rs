//! Application configuration management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::manager::AUTO_SAVE_INTERVAL;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "richpad", "Richpad")
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document reopened on start
    pub last_file: Option<PathBuf>,
    /// Recently opened documents, newest first
    pub recent_files: Vec<PathBuf>,
    /// Editor settings
    pub editor: EditorConfig,
    /// Window settings
    pub window: WindowConfig,
    /// Crash recovery settings
    pub recovery: RecoveryConfig,
}

/// Editor-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size in pixels
    pub font_size: f32,
}

/// Window geometry restored on start
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

/// Auto-save and recovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Seconds between recovery snapshots
    pub auto_save_interval: u64,
    /// Where snapshots go; defaults to `<data dir>/recovery`
    pub recovery_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { font_size: 16.0 }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            auto_save_interval: AUTO_SAVE_INTERVAL.as_secs(),
            recovery_dir: None,
        }
    }
}

impl RecoveryConfig {
    /// Snapshot interval, never shorter than one second
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval.max(1))
    }

    /// Get the recovery directory
    pub fn recovery_dir(&self) -> PathBuf {
        self.recovery_dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("recovery"))
                .unwrap_or_else(|| PathBuf::from("recovery"))
        })
    }
}

impl AppConfig {
    /// Get the config file path
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a document to recent files
    pub fn add_recent_file(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_files.retain(|p| p != &path);
        // Add to front
        self.recent_files.insert(0, path.clone());
        // Keep only last 10
        self.recent_files.truncate(10);
        self.last_file = Some(path);
    }

    /// The last document, if it is still on disk
    pub fn reopen_path(&self) -> Option<&Path> {
        self.last_file.as_deref().filter(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.recovery.auto_save_interval, 30);
        assert!(config.recent_files.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.editor.font_size = 20.0;
        config.recovery.recovery_dir = Some(dir.path().join("rec"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.editor.font_size, 20.0);
        assert_eq!(loaded.recovery.recovery_dir(), dir.path().join("rec"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"recovery": {"auto_save_interval": 0}}"#).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.recovery.interval(), Duration::from_secs(1));
        assert_eq!(loaded.window.width, 1024.0);
    }

    #[test]
    fn test_recent_files_are_capped() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_file(PathBuf::from(format!("/docs/{i}.txt")));
        }
        config.add_recent_file(PathBuf::from("/docs/5.txt"));

        assert_eq!(config.recent_files.len(), 10);
        assert_eq!(config.recent_files[0], PathBuf::from("/docs/5.txt"));
        assert_eq!(config.last_file, Some(PathBuf::from("/docs/5.txt")));
    }

    #[test]
    fn test_reopen_path_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        let mut config = AppConfig::default();
        config.add_recent_file(path.clone());
        assert_eq!(config.reopen_path(), None);

        std::fs::write(&path, "hi").unwrap();
        assert_eq!(config.reopen_path(), Some(path.as_path()));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"editor": {"font_size": 12.0, "word_wrap": false}}"#).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.editor.font_size, 12.0);
    }
}

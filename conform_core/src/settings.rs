//! User settings stored as TOML at `~/.config/conform/config.toml` (Unix) or
//! `%APPDATA%/conform/config.toml` (Windows).

use crate::dates::DEFAULT_DUE_SOON_DAYS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl SettingsError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SettingsError::Io(_) => "io_error",
            SettingsError::Parse(_) => "parse_error",
            SettingsError::Serialize(_) => "serialize_error",
            SettingsError::Invalid(_) => "invalid_setting",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Days ahead at which a due date counts as "due soon"
    pub due_soon_threshold_days: i64,
    /// Catalog file used instead of the built-in demo catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Show the submitter their own secrets after validation
    pub reveal_to_writer: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            due_soon_threshold_days: DEFAULT_DUE_SOON_DAYS,
            catalog_path: None,
            reveal_to_writer: true,
        }
    }
}

impl Settings {
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("conform").join("config.toml")
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "conform.settings", path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        self.check()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.due_soon_threshold_days < 0 {
            return Err(SettingsError::Invalid(format!(
                "due_soon_threshold_days must not be negative (got {})",
                self.due_soon_threshold_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.due_soon_threshold_days, 7);
        assert!(settings.reveal_to_writer);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let settings = Settings {
            due_soon_threshold_days: 3,
            catalog_path: Some(PathBuf::from("/srv/catalog.yaml")),
            reveal_to_writer: false,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "due_soon_threshold_days = 14\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.due_soon_threshold_days, 14);
        assert!(settings.catalog_path.is_none());
        assert!(settings.reveal_to_writer);
    }

    #[test]
    fn test_malformed_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "due_soon_threshold_days = \"soon\"").unwrap();
        assert_eq!(Settings::load_from(&path).unwrap_err().code_str(), "parse_error");

        std::fs::write(&path, "due_soon_threshold_days = -1").unwrap();
        assert_eq!(Settings::load_from(&path).unwrap_err().code_str(), "invalid_setting");
    }
}

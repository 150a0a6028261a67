//! User settings
//!
//! Stored as JSON in the user's config directory:
//! - Linux: ~/.config/person-annotator/settings.json
//! - macOS: ~/Library/Application Support/person-annotator/settings.json
//! - Windows: %APPDATA%\person-annotator\settings.json
//!
//! Loaded once at startup and handed to the `Workbench`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;

const APP_DIR: &str = "person-annotator";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory every imported folder must live under
    pub images_root: PathBuf,
    /// Annotation database opened at startup
    pub database_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let mut database_path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_default();
        database_path.push(APP_DIR);
        database_path.push("annotation.sqlite");

        Self {
            images_root: PathBuf::from("images"),
            database_path,
        }
    }
}

impl Settings {
    /// Where the settings file lives
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_default();
        path.push(APP_DIR);
        path.push("settings.json");
        path
    }

    /// Load settings, falling back to defaults when the file does not exist yet
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::info!("⚙️  No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Absolute location of a root-relative image path
    pub fn image_path(&self, relative: &str) -> PathBuf {
        self.images_root.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.images_root, PathBuf::from("images"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            images_root: PathBuf::from("/srv/photos"),
            database_path: PathBuf::from("/srv/photos/labels.sqlite"),
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "images_root": "/srv/photos" }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.images_root, PathBuf::from("/srv/photos"));
        assert_eq!(settings.database_path, Settings::default().database_path);
    }
}

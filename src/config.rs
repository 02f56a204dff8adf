use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::filter::{DEFAULT_TOP_N, clamp_top_n};
use crate::data::loader::LoadOptions;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "RUSTY_METRO_CONFIG";

/// Cosmetic theme; has no effect on any figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    DarkBlue,
    Light,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::DarkBlue, Theme::Light];

    pub fn label(self) -> &'static str {
        match self {
            Theme::DarkBlue => "Dark/Blue",
            Theme::Light => "Light",
        }
    }
}

/// User settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ridership file opened at startup.
    pub data_path: Option<PathBuf>,
    /// Text encoding of CSV files without a BOM.
    pub encoding: String,
    pub delimiter: char,
    pub default_top_n: usize,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: None,
            encoding: "cp949".to_string(),
            delimiter: ',',
            default_top_n: DEFAULT_TOP_N,
            theme: Theme::default(),
        }
    }
}

impl Settings {
    /// `$RUSTY_METRO_CONFIG`, else the platform config dir, else `./settings.json`.
    pub fn default_path() -> PathBuf {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(p);
        }
        directories::ProjectDirs::from("com", "rusty-metro", "RustyMetro")
            .map(|d| d.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }

    /// Read settings; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let mut settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("parsing settings {}", path.display()))?;
        settings.default_top_n = clamp_top_n(settings.default_top_n);
        Ok(settings)
    }

    /// Like [`Settings::load`], but an unreadable or malformed file is logged
    /// and replaced by the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Settings::load(path).unwrap_or_else(|e| {
            log::warn!("ignoring settings: {e:#}");
            Settings::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loader options; a non-ASCII delimiter falls back to `,`.
    pub fn load_options(&self) -> LoadOptions {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or_else(|| {
                log::warn!("delimiter {:?} is not ASCII, using ','", self.delimiter);
                b','
            });
        LoadOptions {
            encoding: self.encoding.clone(),
            delimiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.load_options(), LoadOptions::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            data_path: Some(PathBuf::from("/data/ridership.csv")),
            theme: Theme::Light,
            default_top_n: 15,
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_defaults_and_clamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "encoding": "utf-8", "default_top_n": 100, "delimiter": ";" }"#)
            .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.encoding, "utf-8");
        assert_eq!(settings.default_top_n, 30);
        assert_eq!(settings.theme, Theme::DarkBlue);
        assert_eq!(settings.load_options().delimiter, b';');
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults_at_startup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());

        std::fs::write(&path, r#"{ "default_top_n": 15 }"#).unwrap();
        assert_eq!(Settings::load_or_default(&path).default_top_n, 15);
    }

    #[test]
    fn non_ascii_delimiter_falls_back() {
        let settings = Settings {
            delimiter: '｜',
            ..Settings::default()
        };
        assert_eq!(settings.load_options().delimiter, b',');
    }
}
